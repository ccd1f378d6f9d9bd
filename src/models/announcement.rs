use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const TITLE_MAX_CHARS: usize = 140;
pub const TEXT_MAX_CHARS: usize = 5000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Announcement {
    pub id: String,
    pub title: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// A validated submission that has not been given an identity yet.
#[derive(Debug, Clone)]
pub struct NewAnnouncement {
    pub title: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl NewAnnouncement {
    /// Client-side key, used when the backend does not assign one.
    pub fn generated_id(&self) -> String {
        token_for(self.created_at)
    }

    pub fn into_announcement(self, id: String) -> Announcement {
        Announcement {
            id,
            title: self.title,
            text: self.text,
            created_at: self.created_at,
        }
    }
}

/// `ann_<unix seconds>_<microseconds>`, the timestamp with six fractional
/// digits and the decimal point replaced.
pub fn token_for(created_at: DateTime<Utc>) -> String {
    format!(
        "ann_{}_{:06}",
        created_at.timestamp(),
        created_at.timestamp_subsec_micros()
    )
}
