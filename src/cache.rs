//! Offline cache of the ranked coin list
//!
//! The last successful top-coins fetch is stored under
//! `cryptoquick_coins_cache`. Descriptions picked up on detail pages are
//! merged in and survive later list refreshes. Entries never expire.

use crate::{
    constants::COINS_CACHE_KEY,
    notify::{ChangeNotifier, Subscription},
    storage::{log_storage_failure, KeyValueStorage},
    types::{Coin, CoinDetail},
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Persistent cache of the most recent ranked coin list
pub struct CoinCache {
    storage: Option<Arc<dyn KeyValueStorage>>,
    notifier: ChangeNotifier,
    /// Serializes read-merge-write cycles on this handle
    write_lock: Mutex<()>,
}

impl CoinCache {
    /// Creates a cache backed by `storage`
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self::with_storage(Some(storage))
    }

    /// Creates a cache with no persistence; it never holds anything
    pub fn detached() -> Self {
        Self::with_storage(None)
    }

    pub fn with_storage(storage: Option<Arc<dyn KeyValueStorage>>) -> Self {
        Self {
            storage,
            notifier: ChangeNotifier::new(COINS_CACHE_KEY),
            write_lock: Mutex::new(()),
        }
    }

    /// Replaces the cached list
    ///
    /// Coins without a description inherit the one previously cached for the
    /// same id.
    pub fn save(&self, coins: &[Coin]) {
        if self.storage.is_none() {
            return;
        }
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        let descriptions: HashMap<String, String> = self
            .get()
            .unwrap_or_default()
            .into_iter()
            .filter_map(|coin| match coin.description {
                Some(d) if !d.is_empty() => Some((coin.id, d)),
                _ => None,
            })
            .collect();

        let merged: Vec<Coin> = coins
            .iter()
            .map(|coin| {
                let mut coin = coin.clone();
                if coin.description_text().is_none() {
                    coin.description = descriptions.get(&coin.id).cloned();
                }
                coin
            })
            .collect();

        if self.persist(&merged) {
            tracing::debug!(
                count = merged.len(),
                preserved_descriptions = descriptions.len(),
                "Saved coin list to cache"
            );
        }
    }

    /// Returns the cached list, or `None` if absent, unreadable or empty
    pub fn get(&self) -> Option<Vec<Coin>> {
        let storage = self.storage.as_ref()?;

        let raw = match storage.get(COINS_CACHE_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                log_storage_failure("Error reading cached coins", COINS_CACHE_KEY, &e);
                return None;
            }
        };

        match serde_json::from_str::<Vec<Coin>>(&raw) {
            Ok(coins) if !coins.is_empty() => Some(coins),
            Ok(_) => None,
            Err(e) => {
                log_storage_failure("Error parsing cached coins", COINS_CACHE_KEY, &e);
                None
            }
        }
    }

    /// Stores the description of a freshly fetched detail
    ///
    /// A coin missing from the cache is appended, built from the detail.
    /// Otherwise only its description changes. Empty descriptions are ignored.
    pub fn update_description(&self, detail: &CoinDetail) {
        let Some(description) = detail.description_text() else {
            return;
        };
        if self.storage.is_none() {
            return;
        }
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        let mut coins = self.get().unwrap_or_default();
        match coins.iter_mut().find(|coin| coin.id == detail.id) {
            Some(coin) => coin.description = Some(description.to_string()),
            None => coins.push(Coin::from_detail(detail)),
        }

        if self.persist(&coins) {
            tracing::debug!(id = %detail.id, "Cached coin description");
        }
    }

    /// Rebuilds a detail record from the cached list
    ///
    /// The market cap rank of the result is always unknown.
    pub fn get_detail(&self, id: &str) -> Option<CoinDetail> {
        self.get()?
            .iter()
            .find(|coin| coin.id == id)
            .map(CoinDetail::from_cached)
    }

    /// Listens for cache changes from this handle and from other contexts
    pub fn subscribe(&self) -> Subscription {
        self.notifier.subscribe(self.storage.as_ref())
    }

    fn persist(&self, coins: &[Coin]) -> bool {
        let Some(storage) = &self.storage else {
            return false;
        };

        let result = serde_json::to_string(coins)
            .map_err(Into::into)
            .and_then(|json| storage.set(COINS_CACHE_KEY, &json));

        match result {
            Ok(()) => {
                self.notifier.notify();
                true
            }
            Err(e) => {
                log_storage_failure("Error writing coin cache", COINS_CACHE_KEY, &e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::ChangeOrigin;
    use crate::provider::mock::{coin, detail, top_ten};
    use crate::storage::MemoryStorage;

    fn cache() -> (Arc<MemoryStorage>, CoinCache) {
        let storage = Arc::new(MemoryStorage::new());
        let cache = CoinCache::new(storage.clone());
        (storage, cache)
    }

    #[test]
    fn test_save_and_get_preserve_order() {
        let (_storage, cache) = cache();
        assert!(cache.get().is_none());

        cache.save(&top_ten());

        let cached = cache.get().unwrap();
        assert_eq!(cached, top_ten());
    }

    #[test]
    fn test_save_keeps_previous_descriptions() {
        let (_storage, cache) = cache();
        let mut first = top_ten();
        first[1].description = Some("Programmable money.".to_string());
        cache.save(&first);

        // A refresh from the API never carries descriptions
        cache.save(&top_ten());

        let cached = cache.get().unwrap();
        assert_eq!(cached[1].description.as_deref(), Some("Programmable money."));
        assert!(cached[0].description.is_none());
    }

    #[test]
    fn test_save_prefers_incoming_description() {
        let (_storage, cache) = cache();
        let mut first = vec![coin("bitcoin", 1.0e12)];
        first[0].description = Some("old".to_string());
        cache.save(&first);

        let mut second = vec![coin("bitcoin", 1.1e12)];
        second[0].description = Some("new".to_string());
        cache.save(&second);

        assert_eq!(
            cache.get().unwrap()[0].description.as_deref(),
            Some("new")
        );
    }

    #[test]
    fn test_empty_or_corrupt_cache_reads_as_absent() {
        let (storage, cache) = cache();

        storage.set(COINS_CACHE_KEY, "[]").unwrap();
        assert!(cache.get().is_none());

        storage.set(COINS_CACHE_KEY, "[{\"id\":").unwrap();
        assert!(cache.get().is_none());
        assert!(cache.get_detail("bitcoin").is_none());
    }

    #[test]
    fn test_update_description_of_cached_coin() {
        let (_storage, cache) = cache();
        cache.save(&top_ten());

        cache.update_description(&detail("ethereum", "World computer."));

        let cached = cache.get().unwrap();
        assert_eq!(cached.len(), 10);
        assert_eq!(cached[1].description.as_deref(), Some("World computer."));
        // Only the description changes
        assert_eq!(cached[1].current_price, top_ten()[1].current_price);
    }

    #[test]
    fn test_update_description_appends_unknown_coin() {
        let (_storage, cache) = cache();
        cache.save(&top_ten());

        cache.update_description(&detail("chainlink", "Oracle network."));

        let cached = cache.get().unwrap();
        assert_eq!(cached.len(), 11);
        let appended = &cached[10];
        assert_eq!(appended.id, "chainlink");
        assert_eq!(appended.symbol, "CHA");
        assert_eq!(appended.image, "chainlink-large.png");
        assert_eq!(appended.current_price, 42.0);

        let rebuilt = cache.get_detail("chainlink").unwrap();
        assert_eq!(rebuilt.market_data.market_cap_rank, None);
        assert_eq!(rebuilt.description.en, "Oracle network.");
    }

    #[test]
    fn test_update_description_without_cache_creates_it() {
        let (_storage, cache) = cache();

        cache.update_description(&detail("polkadot", "Parachains."));

        assert_eq!(cache.get().unwrap().len(), 1);
    }

    #[test]
    fn test_update_description_ignores_empty_text() {
        let (_storage, cache) = cache();
        let mut changes = cache.subscribe();

        cache.update_description(&detail("polkadot", ""));

        assert!(cache.get().is_none());
        assert!(changes.try_recv().is_none());
    }

    #[test]
    fn test_get_detail_synthesizes_from_list_entry() {
        let (_storage, cache) = cache();
        cache.save(&top_ten());

        let detail = cache.get_detail("solana").unwrap();
        let solana = &top_ten()[4];

        assert_eq!(detail.symbol, solana.symbol.to_lowercase());
        assert_eq!(detail.image.thumb, solana.image);
        assert_eq!(detail.image.small, solana.image);
        assert_eq!(detail.image.large, solana.image);
        assert_eq!(detail.description.en, "");
        assert_eq!(detail.market_data.current_price.usd, solana.current_price);
        assert_eq!(detail.market_data.market_cap.usd, solana.market_cap);
        assert_eq!(detail.market_data.market_cap_rank, None);

        assert!(cache.get_detail("unknown").is_none());
    }

    #[test]
    fn test_detached_cache_holds_nothing() {
        let cache = CoinCache::detached();
        cache.save(&top_ten());
        cache.update_description(&detail("bitcoin", "Digital gold."));

        assert!(cache.get().is_none());
        assert!(cache.get_detail("bitcoin").is_none());
    }

    #[test]
    fn test_save_notifies_listeners() {
        let (_storage, cache) = cache();
        let mut changes = cache.subscribe();

        cache.save(&top_ten());

        let change = changes.try_recv().unwrap();
        assert_eq!(change.key, COINS_CACHE_KEY);
        assert_eq!(change.origin, ChangeOrigin::Local);
    }
}
