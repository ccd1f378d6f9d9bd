//! JSON-file backend.
//!
//! The whole collection lives in one pretty-printed JSON array. Every write
//! goes through a temp file in the same directory that is fsynced and then
//! renamed over the target, so readers only ever see a complete document.
//! The store's mutex serializes read-modify-write sequences within this
//! process; it does not guard against other processes writing the file.

use std::fs;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::{sort_newest_first, AnnouncementStore, StoreError};
use crate::models::announcement::{Announcement, NewAnnouncement};
use crate::services::metrics;

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the data file as `[]` if it does not exist yet.
    pub fn ensure_file(&self) -> Result<(), StoreError> {
        let _guard = self.guard();
        ensure_data_file(&self.path)
    }

    /// Every decodable record, in stored order.
    ///
    /// A file that is not valid JSON is moved aside to `<path>.corrupt` and
    /// replaced by an empty array; the caller just sees an empty list.
    pub fn read_all(&self) -> Result<Vec<Announcement>, StoreError> {
        let records = {
            let _guard = self.guard();
            load_records(&self.path)?
        };

        let total = records.len();
        let items: Vec<Announcement> = records
            .into_iter()
            .filter_map(|record| serde_json::from_value(record).ok())
            .collect();
        if items.len() < total {
            debug!(
                path = %self.path.display(),
                skipped = total - items.len(),
                "Skipped undecodable records"
            );
        }
        Ok(items)
    }

    /// Replace the whole collection.
    pub fn write_all(&self, items: &[Announcement]) -> Result<(), StoreError> {
        let _guard = self.guard();
        atomic_write_json(&self.path, items)
    }

    /// Read the current array, push `item`, write it back, all under the lock.
    /// Records this build cannot decode are carried over untouched.
    pub fn append(&self, item: &Announcement) -> Result<(), StoreError> {
        let _guard = self.guard();
        let mut records = load_records(&self.path)?;
        records.push(serde_json::to_value(item)?);
        atomic_write_json(&self.path, &records)
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        // The mutex protects no data of its own, so a poisoned lock is still usable.
        self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl AnnouncementStore for JsonFileStore {
    fn backend(&self) -> &'static str {
        "file"
    }

    async fn list(&self) -> Result<Vec<Announcement>, StoreError> {
        let store = self.clone();
        let mut items = tokio::task::spawn_blocking(move || store.read_all()).await??;
        sort_newest_first(&mut items);
        Ok(items)
    }

    async fn insert(&self, new: NewAnnouncement) -> Result<Announcement, StoreError> {
        let item = {
            let id = new.generated_id();
            new.into_announcement(id)
        };
        let store = self.clone();
        let stored = item.clone();
        tokio::task::spawn_blocking(move || store.append(&stored)).await??;
        Ok(item)
    }

    async fn health(&self) -> Result<(), StoreError> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.ensure_file()).await?
    }
}

fn ensure_data_file(path: &Path) -> Result<(), StoreError> {
    if path.exists() {
        return Ok(());
    }
    atomic_write_json(path, &Vec::<Value>::new())
}

fn load_records(path: &Path) -> Result<Vec<Value>, StoreError> {
    ensure_data_file(path)?;

    let raw = match fs::read(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            atomic_write_json(path, &Vec::<Value>::new())?;
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };

    match serde_json::from_slice::<Value>(&raw) {
        Ok(Value::Array(records)) => Ok(records),
        Ok(_) => {
            warn!(path = %path.display(), "Data file does not hold a JSON array, treating as empty");
            Ok(Vec::new())
        }
        Err(e) => {
            quarantine(path, &e)?;
            Ok(Vec::new())
        }
    }
}

fn quarantine(path: &Path, cause: &serde_json::Error) -> Result<(), StoreError> {
    let backup = corrupt_backup_path(path);
    match fs::rename(path, &backup) {
        Ok(()) => warn!(
            path = %path.display(),
            backup = %backup.display(),
            error = %cause,
            "Corrupt data file moved aside, starting empty"
        ),
        Err(e) => warn!(
            path = %path.display(),
            error = %e,
            "Corrupt data file could not be backed up, overwriting"
        ),
    }
    metrics::CORRUPT_RECOVERIES_COUNTER.inc();
    atomic_write_json(path, &Vec::<Value>::new())
}

pub fn corrupt_backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".corrupt");
    PathBuf::from(name)
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    }
}

fn atomic_write_json<T: Serialize + ?Sized>(path: &Path, data: &T) -> Result<(), StoreError> {
    let dir = parent_dir(path);
    fs::create_dir_all(dir)?;

    let prefix = format!(
        "{}.",
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "announcements".into())
    );
    // Dropped (and removed) unless persisted below.
    let mut tmp = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(".tmp")
        .tempfile_in(dir)?;

    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        serde_json::to_writer_pretty(&mut writer, data)?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
