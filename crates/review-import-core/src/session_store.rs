//! Short-lived key/value storage for upload sessions and import progress.
//!
//! Every entry carries an expiry; expired entries read as absent and are
//! removed on the next read or sweep.

use crate::error::StoreError;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, warn};

pub const UPLOAD_KEY_PREFIX: &str = "upload_data_";
pub const PROGRESS_KEY_PREFIX: &str = "import_progress_";

pub fn upload_key(upload_id: &str) -> String {
    format!("{}{}", UPLOAD_KEY_PREFIX, upload_id)
}

pub fn progress_key(upload_id: &str) -> String {
    format!("{}{}", PROGRESS_KEY_PREFIX, upload_id)
}

pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<(), StoreError>;

    fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Drop every expired entry and return how many were removed
    fn purge_expired(&self) -> Result<usize, StoreError>;
}

/// Read and deserialize an entry. An entry that no longer matches `T` reads as absent.
pub fn load<T: DeserializeOwned>(store: &dyn SessionStore, key: &str) -> Result<Option<T>, StoreError> {
    let Some(value) = store.get(key)? else {
        return Ok(None);
    };
    match serde_json::from_value(value) {
        Ok(typed) => Ok(Some(typed)),
        Err(e) => {
            warn!("Discarding unreadable session entry {}: {}", key, e);
            store.delete(key)?;
            Ok(None)
        }
    }
}

pub fn save<T: Serialize>(store: &dyn SessionStore, key: &str, value: &T, ttl: Duration) -> Result<(), StoreError> {
    store.set(key, serde_json::to_value(value)?, ttl)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Entry {
    expires_at: DateTime<Utc>,
    value: Value,
}

impl Entry {
    fn new(value: Value, ttl: Duration) -> Self {
        let now = Utc::now();
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self { expires_at, value }
    }

    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Process-local store, used by tests and single-run imports
#[derive(Default)]
pub struct MemorySessionStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> Result<MutexGuard<'_, HashMap<String, Entry>>, StoreError> {
        self.entries
            .lock()
            .map_err(|_| StoreError::Rejected("session store lock poisoned".to_string()))
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let mut entries = self.entries()?;
        match entries.get(key) {
            Some(entry) if entry.is_expired(Utc::now()) => {
                entries.remove(key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value.clone())),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<(), StoreError> {
        self.entries()?.insert(key.to_string(), Entry::new(value, ttl));
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.entries()?.remove(key);
        Ok(())
    }

    fn purge_expired(&self) -> Result<usize, StoreError> {
        let now = Utc::now();
        let mut entries = self.entries()?;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        Ok(before - entries.len())
    }
}

/// One JSON file per key, so separate CLI invocations can resume an import
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(dir: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(dir)?;
        Ok(Self { dir: dir.to_path_buf() })
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", file_name))
    }

    fn read_entry(path: &Path) -> Result<Option<Entry>, StoreError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str::<Entry>(&content) {
            Ok(entry) => Ok(Some(entry)),
            Err(e) => {
                warn!("Session file {:?} is corrupt ({}), deleting it", path, e);
                remove_if_present(path)?;
                Ok(None)
            }
        }
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let path = self.entry_path(key);
        match Self::read_entry(&path)? {
            Some(entry) if entry.is_expired(Utc::now()) => {
                debug!("Session entry {} expired", key);
                remove_if_present(&path)?;
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value)),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<(), StoreError> {
        let path = self.entry_path(key);
        let content = serde_json::to_string(&Entry::new(value, ttl))?;

        // Atomic write: write to temp file, then rename
        let temp_path = path.with_extension("json.tmp");
        std::fs::write(&temp_path, content)?;
        std::fs::rename(&temp_path, &path)?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        remove_if_present(&self.entry_path(key))
    }

    fn purge_expired(&self) -> Result<usize, StoreError> {
        let now = Utc::now();
        let mut removed = 0;

        for dir_entry in std::fs::read_dir(&self.dir)? {
            let path = dir_entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            match Self::read_entry(&path)? {
                Some(entry) if entry.is_expired(now) => {
                    remove_if_present(&path)?;
                    removed += 1;
                }
                Some(_) => {}
                // corrupt files are deleted while reading
                None => removed += 1,
            }
        }

        if removed > 0 {
            debug!("Purged {} expired session entries from {:?}", removed, self.dir);
        }
        Ok(removed)
    }
}

fn remove_if_present(path: &Path) -> Result<(), StoreError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
