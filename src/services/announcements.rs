use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, SubsecRound, Utc};
use tracing::{error, info};

use crate::{
    models::announcement::{Announcement, NewAnnouncement, TEXT_MAX_CHARS, TITLE_MAX_CHARS},
    services::metrics,
    storage::{AnnouncementStore, StoreError},
};

pub const REQUIRED_FIELDS_MESSAGE: &str = "Both 'title' and 'text' are required.";

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{}", REQUIRED_FIELDS_MESSAGE)]
    Validation,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Strip surrounding whitespace and cap at `max_chars` characters, trimming
/// whatever whitespace the cut leaves at the end. Missing input is empty.
pub fn normalize_field(raw: Option<&str>, max_chars: usize) -> String {
    let trimmed = raw.unwrap_or_default().trim();
    match trimmed.char_indices().nth(max_chars) {
        Some((cut, _)) => trimmed[..cut].trim_end().to_string(),
        None => trimmed.to_string(),
    }
}

pub struct AnnouncementService {
    store: Arc<dyn AnnouncementStore>,
    last_issued: Mutex<Option<DateTime<Utc>>>,
}

impl AnnouncementService {
    pub fn new(store: Arc<dyn AnnouncementStore>) -> Self {
        Self {
            store,
            last_issued: Mutex::new(None),
        }
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    /// Validate a submission and persist it.
    pub async fn create(
        &self,
        title_raw: Option<&str>,
        text_raw: Option<&str>,
    ) -> Result<Announcement, ServiceError> {
        let title = normalize_field(title_raw, TITLE_MAX_CHARS);
        let text = normalize_field(text_raw, TEXT_MAX_CHARS);
        if title.is_empty() || text.is_empty() {
            metrics::REJECTED_COUNTER.inc();
            return Err(ServiceError::Validation);
        }

        let new = NewAnnouncement {
            title,
            text,
            created_at: self.next_instant(),
        };

        let backend = self.backend();
        match self.store.insert(new).await {
            Ok(item) => {
                metrics::CREATED_COUNTER.with_label_values(&[backend]).inc();
                info!(id = %item.id, backend, "Announcement created");
                Ok(item)
            }
            Err(e) => {
                metrics::STORAGE_ERRORS_COUNTER
                    .with_label_values(&[backend, "insert"])
                    .inc();
                error!(backend, "Failed to store announcement: {e}");
                Err(e.into())
            }
        }
    }

    /// Every announcement, newest first.
    pub async fn list_all(&self) -> Result<Vec<Announcement>, ServiceError> {
        let backend = self.backend();
        match self.store.list().await {
            Ok(items) => {
                metrics::LISTED_GAUGE
                    .with_label_values(&[backend])
                    .set(items.len() as f64);
                Ok(items)
            }
            Err(e) => {
                metrics::STORAGE_ERRORS_COUNTER
                    .with_label_values(&[backend, "list"])
                    .inc();
                error!(backend, "Failed to list announcements: {e}");
                Err(e.into())
            }
        }
    }

    pub async fn health(&self) -> Result<(), StoreError> {
        self.store.health().await
    }

    /// Current UTC time at microsecond precision, strictly after the last
    /// instant this service handed out.
    fn next_instant(&self) -> DateTime<Utc> {
        let now = Utc::now().trunc_subsecs(6);
        let mut last = self
            .last_issued
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let issued = match *last {
            Some(prev) if now <= prev => prev + Duration::microseconds(1),
            _ => now,
        };
        *last = Some(issued);
        issued
    }
}
