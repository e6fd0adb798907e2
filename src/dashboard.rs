//! Dashboard service
//!
//! Wires the CoinGecko provider, the persistence stores and the view models
//! together, with a lazily built process-wide instance.

use crate::{
    cache::CoinCache,
    config::ClientConfig,
    error::CoinGeckoError,
    metrics::RequestMetrics,
    navigation::adjacent_coins,
    provider::MarketDataProvider,
    providers::{CoinGeckoProvider, MeteredProvider},
    storage::{FileStorage, KeyValueStorage, MemoryStorage},
    types::{AdjacentCoins, ComponentHealth, HealthStatus},
    views::{load_detail, CoinListView, DetailView, LoadOutcome},
    watchlist::WatchlistStore,
};
use std::sync::Arc;
use tokio::sync::OnceCell;

static GLOBAL_DASHBOARD: OnceCell<Arc<Dashboard>> = OnceCell::const_new();

/// Top-10 coin dashboard
///
/// # Example
/// ```no_run
/// use cryptoquick_sdk::Dashboard;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let dashboard = Dashboard::global().await?;
/// dashboard.load_coins().await;
/// for coin in dashboard.list().visible_coins().await {
///     println!("{}: ${:.2}", coin.symbol, coin.current_price);
/// }
/// # Ok(())
/// # }
/// ```
pub struct Dashboard {
    provider: Arc<MeteredProvider>,
    cache: Arc<CoinCache>,
    watchlist: Arc<WatchlistStore>,
    list: CoinListView,
}

impl Dashboard {
    /// Returns the process-wide instance
    ///
    /// The first call builds it from `ClientConfig::from_env()`.
    pub async fn global() -> Result<Arc<Self>, CoinGeckoError> {
        GLOBAL_DASHBOARD
            .get_or_try_init(|| async { Self::from_config(&ClientConfig::from_env()).map(Arc::new) })
            .await
            .cloned()
    }

    /// Creates a dashboard talking to CoinGecko
    ///
    /// Storage lives in `config.storage_dir` when set. Otherwise, or when that
    /// directory cannot be used, state is kept in memory for the process.
    pub fn from_config(config: &ClientConfig) -> Result<Self, CoinGeckoError> {
        let provider = Arc::new(CoinGeckoProvider::new(config)?);
        Ok(Self::with_provider(provider, Some(open_storage(config))))
    }

    /// Creates a dashboard with a custom provider and storage
    ///
    /// This is primarily for testing with mock providers. Passing `None` for
    /// storage disables persistence entirely.
    pub fn with_provider(
        provider: Arc<dyn MarketDataProvider>,
        storage: Option<Arc<dyn KeyValueStorage>>,
    ) -> Self {
        let provider = Arc::new(MeteredProvider::new(provider));
        let cache = Arc::new(CoinCache::with_storage(storage.clone()));
        let watchlist = Arc::new(WatchlistStore::with_storage(storage));
        let list = CoinListView::new(provider.clone(), cache.clone(), watchlist.clone());

        tracing::info!(
            provider = provider.provider_name(),
            "Dashboard initialized"
        );

        Self {
            provider,
            cache,
            watchlist,
            list,
        }
    }

    /// The list view model
    pub fn list(&self) -> &CoinListView {
        &self.list
    }

    pub fn watchlist(&self) -> &WatchlistStore {
        &self.watchlist
    }

    pub fn cache(&self) -> &CoinCache {
        &self.cache
    }

    /// Reloads the coin list
    pub async fn load_coins(&self) -> LoadOutcome {
        self.list.load().await
    }

    /// Loads the detail page of one coin
    pub async fn coin_detail(&self, id: &str) -> DetailView {
        load_detail(id, self.provider.as_ref(), &self.cache).await
    }

    /// Previous and next coin around `id` in rank order
    pub async fn adjacent(&self, id: &str) -> AdjacentCoins {
        adjacent_coins(id, &self.cache, self.provider.as_ref()).await
    }

    /// Adds or removes a coin from the watchlist
    ///
    /// # Returns
    /// Whether the coin is on the watchlist afterwards
    pub fn toggle_watch(&self, id: &str) -> bool {
        self.watchlist.toggle(id)
    }

    /// Request latency, success rate and rate-limit counters
    pub async fn metrics(&self) -> RequestMetrics {
        self.provider.metrics().await
    }

    /// Perform a health check on the dashboard
    ///
    /// # Returns
    /// ComponentHealth indicating whether live, cached or no data is available
    pub async fn health_check(&self) -> ComponentHealth {
        let mut details = std::collections::HashMap::new();

        let state = self.list.snapshot().await;
        let cached = self.cache.get().map(|coins| coins.len()).unwrap_or(0);
        let metrics = self.metrics().await;

        details.insert("listed_coins".to_string(), serde_json::json!(state.coins.len()));
        details.insert("cached_coins".to_string(), serde_json::json!(cached));
        details.insert(
            "watchlist_size".to_string(),
            serde_json::json!(self.watchlist.get().len()),
        );
        details.insert(
            "provider_name".to_string(),
            serde_json::json!(metrics.provider_name),
        );
        details.insert(
            "success_rate".to_string(),
            serde_json::json!(metrics.success_rate),
        );
        details.insert(
            "rate_limited_requests".to_string(),
            serde_json::json!(metrics.rate_limited_requests()),
        );
        if let Some(reset_at) = metrics.last_reset_at {
            details.insert("last_reset_at".to_string(), serde_json::json!(reset_at));
        }

        let status = if state.coins.is_empty() && cached == 0 {
            HealthStatus::Unhealthy
        } else if state.showing_cached || state.last_error.is_some() {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };

        let message = match status {
            HealthStatus::Healthy => "Dashboard is showing live data".to_string(),
            HealthStatus::Degraded => match &state.last_error {
                Some(e) => format!("Dashboard is showing cached data ({})", e.kind()),
                None => "Dashboard is showing cached data".to_string(),
            },
            HealthStatus::Unhealthy => "Dashboard has no coin data".to_string(),
        };

        ComponentHealth {
            name: "cryptoquick_dashboard".to_string(),
            status,
            message: Some(message),
            details,
            last_checked: chrono::Utc::now(),
        }
    }
}

fn open_storage(config: &ClientConfig) -> Arc<dyn KeyValueStorage> {
    if let Some(dir) = &config.storage_dir {
        match FileStorage::open(dir) {
            Ok(storage) => {
                tracing::info!(dir = %dir.display(), "Using file storage");
                return Arc::new(storage);
            }
            Err(e) => {
                tracing::warn!(
                    dir = %dir.display(),
                    error = %e,
                    "Storage directory unusable, keeping state in memory"
                );
            }
        }
    }
    Arc::new(MemoryStorage::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::formatters::{format_change, format_market_cap, format_price};
    use crate::provider::mock::{detail, top_ten, MockProvider};
    use crate::views::list::{CACHED_NOTICE_MESSAGE, CACHED_NOTICE_TITLE};

    fn dashboard(provider: Arc<MockProvider>) -> Dashboard {
        Dashboard::with_provider(provider, Some(Arc::new(MemoryStorage::new())))
    }

    #[tokio::test]
    async fn test_offline_session_renders_cached_coins() {
        let provider = Arc::new(MockProvider::new());
        let dashboard = dashboard(provider.clone());

        // First visit populates the cache
        provider.set_top_coins(top_ten());
        assert_eq!(dashboard.load_coins().await, LoadOutcome::Fresh);

        // Later the network drops
        provider.set_top_coins_error(CoinGeckoError::new(
            ErrorKind::Network,
            "Network error. This might be due to API rate limiting.",
        ));
        assert_eq!(dashboard.load_coins().await, LoadOutcome::Cached);

        let state = dashboard.list().snapshot().await;
        assert!(state.showing_cached);
        assert!(state.error.is_none());
        assert_eq!(state.coins, top_ten());
        assert_eq!(CACHED_NOTICE_TITLE, "Showing cached data");
        assert!(CACHED_NOTICE_MESSAGE.contains("previously saved"));

        let health = dashboard.health_check().await;
        assert_eq!(health.status, HealthStatus::Degraded);
        assert_eq!(health.details["cached_coins"], serde_json::json!(10));
    }

    #[tokio::test]
    async fn test_detail_then_refresh_keeps_description() {
        let provider = Arc::new(MockProvider::new());
        let dashboard = dashboard(provider.clone());
        provider.set_top_coins(top_ten());
        provider.set_detail(detail("ethereum", "World computer."));

        dashboard.load_coins().await;
        assert!(matches!(
            dashboard.coin_detail("ethereum").await,
            DetailView::Live(_)
        ));
        dashboard.load_coins().await;

        let cached = dashboard.cache().get().unwrap();
        assert_eq!(cached[1].description.as_deref(), Some("World computer."));
    }

    #[tokio::test]
    async fn test_adjacent_uses_loaded_ranking() {
        let provider = Arc::new(MockProvider::new());
        let dashboard = dashboard(provider.clone());
        provider.set_top_coins(top_ten());
        dashboard.load_coins().await;

        let adjacent = dashboard.adjacent("bitcoin").await;

        assert!(adjacent.previous.is_none());
        assert_eq!(adjacent.next.unwrap().rank, 2);
        // Served from cache, not refetched
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_watch_toggle_and_metrics() {
        let provider = Arc::new(MockProvider::new());
        let dashboard = dashboard(provider.clone());
        provider.set_top_coins_error(
            CoinGeckoError::new(ErrorKind::RateLimited, "limited")
                .with_status(429)
                .with_reset_at(Some(99)),
        );

        assert!(dashboard.toggle_watch("bitcoin"));
        assert!(dashboard.watchlist().contains("bitcoin"));
        assert!(!dashboard.toggle_watch("bitcoin"));

        assert_eq!(dashboard.load_coins().await, LoadOutcome::Failed);
        let metrics = dashboard.metrics().await;
        assert_eq!(metrics.rate_limited_requests(), 1);
        assert_eq!(metrics.last_reset_at, Some(99));

        let health = dashboard.health_check().await;
        assert_eq!(health.status, HealthStatus::Unhealthy);
    }

    #[tokio::test]
    async fn test_healthy_after_live_load() {
        let provider = Arc::new(MockProvider::new());
        let dashboard = dashboard(provider.clone());
        provider.set_top_coins(top_ten());
        dashboard.load_coins().await;

        let health = dashboard.health_check().await;
        assert_eq!(health.status, HealthStatus::Healthy);

        let bitcoin = &dashboard.list().visible_coins().await[0];
        assert_eq!(format_market_cap(bitcoin.market_cap), "$1.00T");
        assert_eq!(format_price(bitcoin.current_price), "$100,000.00");
        assert_eq!(format_change(bitcoin.price_change_percentage_24h), "+1.50%");
    }

    #[test]
    fn test_unusable_storage_dir_falls_back_to_memory() {
        let file = std::env::temp_dir().join(format!("cryptoquick-file-{}", uuid::Uuid::new_v4()));
        std::fs::write(&file, "not a directory").unwrap();
        let config = ClientConfig::default().with_storage_dir(&file);

        let storage = open_storage(&config);
        storage.set("cryptoquick_watchlist", "[]").unwrap();
        assert_eq!(
            storage.get("cryptoquick_watchlist").unwrap().as_deref(),
            Some("[]")
        );

        let _ = std::fs::remove_file(&file);
    }
}
