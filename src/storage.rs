//! Key-value storage backends for the persistence stores
//!
//! The stores never touch a concrete medium directly. They receive an
//! `Arc<dyn KeyValueStorage>` and only use `get`, `set` and `remove`, so tests
//! and non-browser hosts can plug in whatever fits.

use crate::{constants::CHANGE_CHANNEL_CAPACITY, error::StorageError};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use uuid::Uuid;

/// A write observed on shared storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageWrite {
    /// Key that was written or removed
    pub key: String,
    /// Context that performed the write
    pub context: Uuid,
}

/// Minimal string key-value capability
pub trait KeyValueStorage: Send + Sync {
    /// Reads a value; `Ok(None)` when the key is absent
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Deletes a key; absent keys are not an error
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Writes made through other contexts sharing this storage
    ///
    /// Backends that cannot observe other writers return `None`.
    fn external_changes(&self) -> Option<ExternalChanges> {
        None
    }
}

/// Receiver for writes made by other contexts
///
/// Writes from the context that created the receiver are skipped, which
/// mirrors how a browser never fires `storage` events in the writing tab.
pub struct ExternalChanges {
    context: Uuid,
    rx: broadcast::Receiver<StorageWrite>,
}

impl ExternalChanges {
    /// Waits for the next write from another context
    ///
    /// Returns `None` once the storage has been dropped.
    pub async fn recv(&mut self) -> Option<StorageWrite> {
        loop {
            match self.rx.recv().await {
                Ok(write) if write.context != self.context => return Some(write),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "External change receiver lagged");
                    continue;
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Returns a pending write from another context without waiting
    pub fn try_recv(&mut self) -> Option<StorageWrite> {
        loop {
            match self.rx.try_recv() {
                Ok(write) if write.context != self.context => return Some(write),
                Ok(_) => continue,
                Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }
}

struct SharedMemory {
    entries: RwLock<HashMap<String, String>>,
    writes: broadcast::Sender<StorageWrite>,
    quota_bytes: Option<usize>,
}

/// In-process storage
///
/// Every `connect()` returns a new context onto the same entries, the way
/// several tabs share one origin's local storage. Writes are published to all
/// contexts.
pub struct MemoryStorage {
    shared: Arc<SharedMemory>,
    context: Uuid,
}

impl MemoryStorage {
    /// Creates empty storage with no size limit
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Creates empty storage that rejects writes once the stored values
    /// exceed `quota_bytes`
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self::build(Some(quota_bytes))
    }

    fn build(quota_bytes: Option<usize>) -> Self {
        let (writes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            shared: Arc::new(SharedMemory {
                entries: RwLock::new(HashMap::new()),
                writes,
                quota_bytes,
            }),
            context: Uuid::new_v4(),
        }
    }

    /// Opens another context onto the same entries
    pub fn connect(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            context: Uuid::new_v4(),
        }
    }

    /// Identifier of this context
    pub fn context_id(&self) -> Uuid {
        self.context
    }

    fn publish(&self, key: &str) {
        // No receivers is fine
        let _ = self.shared.writes.send(StorageWrite {
            key: key.to_string(),
            context: self.context,
        });
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> StorageError {
    StorageError::unavailable("storage lock poisoned")
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.shared.entries.read().map_err(|_| poisoned())?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        {
            let mut entries = self.shared.entries.write().map_err(|_| poisoned())?;

            if let Some(quota) = self.shared.quota_bytes {
                let used: usize = entries
                    .iter()
                    .filter(|(k, _)| k.as_str() != key)
                    .map(|(k, v)| k.len() + v.len())
                    .sum();
                if used + key.len() + value.len() > quota {
                    return Err(StorageError::unavailable(format!(
                        "quota of {} bytes exceeded",
                        quota
                    )));
                }
            }

            entries.insert(key.to_string(), value.to_string());
        }
        self.publish(key);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let removed = {
            let mut entries = self.shared.entries.write().map_err(|_| poisoned())?;
            entries.remove(key).is_some()
        };
        if removed {
            self.publish(key);
        }
        Ok(())
    }

    fn external_changes(&self) -> Option<ExternalChanges> {
        Some(ExternalChanges {
            context: self.context,
            rx: self.shared.writes.subscribe(),
        })
    }
}

/// Directory-backed storage, one JSON file per key
///
/// Writes go through a temporary file and a rename so readers never see a
/// half-written value. Other processes writing the same directory are not
/// observed.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Uses `dir` for storage, creating it if needed
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Directory holding the stored files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StorageError::unavailable(format!(
                "invalid storage key: {:?}",
                key
            )));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == IoErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == IoErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Logs a swallowed storage failure
///
/// Debug builds log at warn level; release builds keep it at debug so users
/// never see persistence noise.
pub(crate) fn log_storage_failure(action: &str, key: &str, err: &dyn std::fmt::Display) {
    if cfg!(debug_assertions) {
        tracing::warn!(key, error = %err, "{}", action);
    } else {
        tracing::debug!(key, error = %err, "{}", action);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("cryptoquick-test-{}", Uuid::new_v4()))
    }

    #[test]
    fn test_memory_storage_roundtrip() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("k").unwrap(), None);

        storage.set("k", "v").unwrap();
        assert_eq!(storage.get("k").unwrap(), Some("v".to_string()));

        storage.remove("k").unwrap();
        assert_eq!(storage.get("k").unwrap(), None);
        storage.remove("k").unwrap();
    }

    #[test]
    fn test_contexts_share_entries() {
        let tab_a = MemoryStorage::new();
        let tab_b = tab_a.connect();

        tab_a.set("shared", "1").unwrap();
        assert_eq!(tab_b.get("shared").unwrap(), Some("1".to_string()));
        assert_ne!(tab_a.context_id(), tab_b.context_id());
    }

    #[test]
    fn test_external_changes_skip_own_writes() {
        let tab_a = MemoryStorage::new();
        let tab_b = tab_a.connect();
        let mut a_changes = tab_a.external_changes().unwrap();
        let mut b_changes = tab_b.external_changes().unwrap();

        tab_a.set("key", "value").unwrap();

        assert_eq!(a_changes.try_recv(), None);
        let write = b_changes.try_recv().unwrap();
        assert_eq!(write.key, "key");
        assert_eq!(write.context, tab_a.context_id());
    }

    #[test]
    fn test_quota_rejects_large_values() {
        let storage = MemoryStorage::with_quota(16);
        storage.set("a", "small").unwrap();

        let err = storage.set("b", "this value is far too large").unwrap_err();
        assert!(matches!(err, StorageError::Unavailable(_)));
        assert_eq!(storage.get("b").unwrap(), None);

        // Overwriting an existing key only counts the new value
        storage.set("a", "replaced").unwrap();
    }

    #[test]
    fn test_file_storage_roundtrip() {
        let dir = temp_dir();
        let storage = FileStorage::open(&dir).unwrap();

        assert_eq!(storage.get("cryptoquick_watchlist").unwrap(), None);
        storage.set("cryptoquick_watchlist", "[\"bitcoin\"]").unwrap();
        assert_eq!(
            storage.get("cryptoquick_watchlist").unwrap(),
            Some("[\"bitcoin\"]".to_string())
        );
        storage.remove("cryptoquick_watchlist").unwrap();
        assert_eq!(storage.get("cryptoquick_watchlist").unwrap(), None);
        assert!(storage.external_changes().is_none());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_file_storage_rejects_path_keys() {
        let dir = temp_dir();
        let storage = FileStorage::open(&dir).unwrap();

        assert!(storage.set("../escape", "x").is_err());
        assert!(storage.get("").is_err());

        let _ = fs::remove_dir_all(&dir);
    }
}
