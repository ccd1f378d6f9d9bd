//! Persistence backends for announcements.
//!
//! Both backends honour the same contract: append-only inserts and a full
//! read, newest first.

pub mod file;
pub mod postgres;

use async_trait::async_trait;

use crate::models::announcement::{Announcement, NewAnnouncement};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode announcements: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Database(#[from] sqlx::Error),

    #[error("storage task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[async_trait]
pub trait AnnouncementStore: Send + Sync {
    /// Short backend name used in logs and metric labels.
    fn backend(&self) -> &'static str;

    /// All stored announcements, newest first.
    async fn list(&self) -> Result<Vec<Announcement>, StoreError>;

    /// Persist a new announcement and return it with its identity.
    async fn insert(&self, new: NewAnnouncement) -> Result<Announcement, StoreError>;

    /// Cheap connectivity check, independent of business reads.
    async fn health(&self) -> Result<(), StoreError>;
}

/// Newest first; entries with equal timestamps keep their stored order.
pub(crate) fn sort_newest_first(items: &mut [Announcement]) {
    items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn at(id: &str, secs: i64) -> Announcement {
        Announcement {
            id: id.into(),
            title: "t".into(),
            text: "x".into(),
            created_at: Utc.timestamp_opt(secs, 0).unwrap(),
        }
    }

    #[test]
    fn test_sort_is_stable_for_equal_timestamps() {
        let mut items = vec![at("a", 1), at("b", 2), at("c", 2), at("d", 3)];
        sort_newest_first(&mut items);
        let ids: Vec<_> = items.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, ["d", "b", "c", "a"]);
    }
}
