//! Key/value persistence for the settings record.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Key the settings record is stored under.
pub const STORAGE_KEY: &str = "chatBubbleSettings";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage quota exceeded: {needed} bytes needed, limit is {limit}")]
    QuotaExceeded { needed: u64, limit: u64 },

    #[error("storage file {path} is unreadable: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("storage I/O on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// String key/value store with a capacity limit, shaped like browser local storage.
pub trait SettingsStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// Bytes counted against the quota: every key plus its value.
fn stored_size(entries: &BTreeMap<String, String>) -> u64 {
    entries
        .iter()
        .map(|(k, v)| (k.len() + v.len()) as u64)
        .sum()
}

fn check_quota(entries: &BTreeMap<String, String>, limit: Option<u64>) -> Result<(), StorageError> {
    let needed = stored_size(entries);
    match limit {
        Some(limit) if needed > limit => Err(StorageError::QuotaExceeded { needed, limit }),
        _ => Ok(()),
    }
}

/// In-memory store.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
    quota: Option<u64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota: u64) -> Self {
        Self {
            entries: BTreeMap::new(),
            quota: Some(quota),
        }
    }
}

impl SettingsStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut next = self.entries.clone();
        next.insert(key.to_string(), value.to_string());
        check_quota(&next, self.quota)?;
        self.entries = next;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// JSON object file on disk, one string value per key.
///
/// Each write replaces the file through a sibling temp file, so a failed or
/// rejected write leaves the previous contents in place.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    quota: Option<u64>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>, quota: Option<u64>) -> Self {
        Self {
            path: path.into(),
            quota,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(self.io_err(e)),
        };
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&contents).map_err(|source| StorageError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// Entries to base a write on. An unreadable file is treated as empty so
    /// the write replaces it instead of failing forever.
    fn read_for_write(&self) -> Result<(BTreeMap<String, String>, bool), StorageError> {
        match self.read_all() {
            Ok(entries) => Ok((entries, false)),
            Err(StorageError::Corrupt { source, .. }) => {
                tracing::warn!(path = %self.path.display(), "replacing unreadable storage file: {source}");
                Ok((BTreeMap::new(), true))
            }
            Err(e) => Err(e),
        }
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
        }
        let json = serde_json::to_string_pretty(entries).map_err(|source| StorageError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| self.io_err(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.io_err(e))
    }
}

impl SettingsStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let (mut entries, _) = self.read_for_write()?;
        entries.insert(key.to_string(), value.to_string());
        check_quota(&entries, self.quota)?;
        tracing::debug!(path = %self.path.display(), key, bytes = value.len(), "writing storage");
        self.write_all(&entries)
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        let (mut entries, corrupt) = self.read_for_write()?;
        if entries.remove(key).is_some() || corrupt {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_roundtrip() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get(STORAGE_KEY).unwrap(), None);
        store.set(STORAGE_KEY, "{}").unwrap();
        assert_eq!(store.get(STORAGE_KEY).unwrap().as_deref(), Some("{}"));
        store.remove(STORAGE_KEY).unwrap();
        assert_eq!(store.get(STORAGE_KEY).unwrap(), None);
    }

    #[test]
    fn memory_store_rejects_over_quota_and_keeps_old_value() {
        let mut store = MemoryStore::with_quota(40);
        store.set(STORAGE_KEY, "small").unwrap();

        let err = store.set(STORAGE_KEY, &"x".repeat(100)).unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { limit: 40, .. }));
        assert_eq!(store.get(STORAGE_KEY).unwrap().as_deref(), Some("small"));
    }

    #[test]
    fn file_store_missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested/storage.json"), None);
        assert_eq!(store.get(STORAGE_KEY).unwrap(), None);
    }

    #[test]
    fn file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/storage.json");

        let mut store = FileStore::new(&path, None);
        store.set(STORAGE_KEY, r#"{"bubbleOpacity":0.4}"#).unwrap();
        store.set("other", "kept").unwrap();

        let reopened = FileStore::new(&path, None);
        assert_eq!(
            reopened.get(STORAGE_KEY).unwrap().as_deref(),
            Some(r#"{"bubbleOpacity":0.4}"#)
        );
        assert_eq!(reopened.get("other").unwrap().as_deref(), Some("kept"));
    }

    #[test]
    fn file_store_quota_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        let mut store = FileStore::new(&path, Some(64));
        store.set(STORAGE_KEY, "before").unwrap();
        let before = std::fs::read_to_string(&path).unwrap();

        let err = store.set(STORAGE_KEY, &"y".repeat(500)).unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { .. }));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
        assert_eq!(store.get(STORAGE_KEY).unwrap().as_deref(), Some("before"));
    }

    #[test]
    fn file_store_remove_only_drops_key() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path().join("storage.json"), None);
        store.set(STORAGE_KEY, "a").unwrap();
        store.set("other", "b").unwrap();

        store.remove(STORAGE_KEY).unwrap();
        assert_eq!(store.get(STORAGE_KEY).unwrap(), None);
        assert_eq!(store.get("other").unwrap().as_deref(), Some("b"));
    }

    #[test]
    fn file_store_reports_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "[not an object").unwrap();

        let store = FileStore::new(&path, None);
        assert!(matches!(store.get(STORAGE_KEY), Err(StorageError::Corrupt { .. })));
    }

    #[test]
    fn file_store_remove_replaces_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "{truncated").unwrap();

        let mut store = FileStore::new(&path, None);
        store.remove(STORAGE_KEY).unwrap();
        assert_eq!(store.get(STORAGE_KEY).unwrap(), None);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
    }

    #[test]
    fn file_store_set_replaces_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "{truncated").unwrap();

        let mut store = FileStore::new(&path, None);
        store.set(STORAGE_KEY, "fresh").unwrap();
        assert_eq!(store.get(STORAGE_KEY).unwrap().as_deref(), Some("fresh"));
    }
}
