//! Watchlist persistence
//!
//! The watchlist is an ordered list of coin ids stored as one JSON array under
//! `cryptoquick_watchlist`. Storage problems are logged and otherwise ignored:
//! a broken store behaves like an empty watchlist.

use crate::{
    constants::WATCHLIST_STORAGE_KEY,
    notify::{ChangeNotifier, Subscription},
    storage::{log_storage_failure, KeyValueStorage},
};
use std::sync::{Arc, Mutex};

/// User-curated set of favorite coin ids
pub struct WatchlistStore {
    storage: Option<Arc<dyn KeyValueStorage>>,
    notifier: ChangeNotifier,
    /// Serializes read-modify-write cycles on this handle
    write_lock: Mutex<()>,
}

impl WatchlistStore {
    /// Creates a store backed by `storage`
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self::with_storage(Some(storage))
    }

    /// Creates a store with no persistence; reads are empty and writes do nothing
    pub fn detached() -> Self {
        Self::with_storage(None)
    }

    pub fn with_storage(storage: Option<Arc<dyn KeyValueStorage>>) -> Self {
        Self {
            storage,
            notifier: ChangeNotifier::new(WATCHLIST_STORAGE_KEY),
            write_lock: Mutex::new(()),
        }
    }

    /// Returns the stored ids, or an empty list if absent or unreadable
    pub fn get(&self) -> Vec<String> {
        let Some(storage) = &self.storage else {
            return Vec::new();
        };

        let raw = match storage.get(WATCHLIST_STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                log_storage_failure("Error reading watchlist", WATCHLIST_STORAGE_KEY, &e);
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<String>>(&raw) {
            Ok(ids) => dedup_preserving_order(ids),
            Err(e) => {
                log_storage_failure("Error parsing watchlist", WATCHLIST_STORAGE_KEY, &e);
                Vec::new()
            }
        }
    }

    /// Appends `id` unless it is already present
    pub fn add(&self, id: &str) {
        if self.storage.is_none() {
            return;
        }
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        let mut ids = self.get();
        if ids.iter().any(|existing| existing == id) {
            return;
        }
        ids.push(id.to_string());

        if self.persist(&ids) {
            tracing::debug!(id, count = ids.len(), "Added coin to watchlist");
            self.notifier.notify();
        }
    }

    /// Removes `id`; the list is rewritten and listeners notified either way
    pub fn remove(&self, id: &str) {
        if self.storage.is_none() {
            return;
        }
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        let ids: Vec<String> = self.get().into_iter().filter(|i| i != id).collect();

        if self.persist(&ids) {
            tracing::debug!(id, count = ids.len(), "Removed coin from watchlist");
            self.notifier.notify();
        }
    }

    /// Checks membership against the stored list
    pub fn contains(&self, id: &str) -> bool {
        self.get().iter().any(|existing| existing == id)
    }

    /// Adds `id` if absent, removes it if present
    ///
    /// # Returns
    /// Whether `id` is on the watchlist afterwards
    pub fn toggle(&self, id: &str) -> bool {
        if self.contains(id) {
            self.remove(id);
        } else {
            self.add(id);
        }
        self.contains(id)
    }

    /// Listens for watchlist changes from this handle and from other contexts
    pub fn subscribe(&self) -> Subscription {
        self.notifier.subscribe(self.storage.as_ref())
    }

    fn persist(&self, ids: &[String]) -> bool {
        let Some(storage) = &self.storage else {
            return false;
        };

        let result = serde_json::to_string(ids)
            .map_err(Into::into)
            .and_then(|json| storage.set(WATCHLIST_STORAGE_KEY, &json));

        match result {
            Ok(()) => true,
            Err(e) => {
                log_storage_failure("Error writing watchlist", WATCHLIST_STORAGE_KEY, &e);
                false
            }
        }
    }
}

fn dedup_preserving_order(ids: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}
