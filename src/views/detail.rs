//! Coin detail view model

use crate::{
    cache::CoinCache, provider::MarketDataProvider, types::CoinDetail,
    views::banner::ErrorBanner,
};

/// What the detail page should show
#[derive(Debug, Clone, PartialEq)]
pub enum DetailView {
    /// Freshly fetched detail
    Live(CoinDetail),
    /// The fetch failed; this was rebuilt from the coin-list cache
    Cached(CoinDetail),
    /// The API does not know this coin
    NotFound,
    /// The fetch failed and nothing was cached
    Failed(ErrorBanner),
}

impl DetailView {
    /// The coin to render, if any
    pub fn coin(&self) -> Option<&CoinDetail> {
        match self {
            DetailView::Live(detail) | DetailView::Cached(detail) => Some(detail),
            DetailView::NotFound | DetailView::Failed(_) => None,
        }
    }

    pub fn is_cached(&self) -> bool {
        matches!(self, DetailView::Cached(_))
    }
}

/// Loads the detail page for `id`
///
/// A live detail has its description written back to the cache. A 404 maps to
/// `NotFound` without consulting the cache; any other failure prefers cached
/// data over an error banner.
pub async fn load_detail(
    id: &str,
    provider: &dyn MarketDataProvider,
    cache: &CoinCache,
) -> DetailView {
    match provider.fetch_coin_detail(id).await {
        Ok(detail) => {
            cache.update_description(&detail);
            DetailView::Live(detail)
        }
        Err(e) if e.is_not_found() => {
            tracing::debug!(id, "Coin not found");
            DetailView::NotFound
        }
        Err(e) => match cache.get_detail(id) {
            Some(cached) => {
                tracing::info!(id, kind = %e.kind(), "Showing cached coin detail");
                DetailView::Cached(cached)
            }
            None => DetailView::Failed(ErrorBanner::from_error(&e)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CoinGeckoError, ErrorKind};
    use crate::provider::mock::{detail, top_ten, MockProvider};
    use crate::storage::MemoryStorage;
    use std::sync::Arc;

    fn cache() -> CoinCache {
        CoinCache::new(Arc::new(MemoryStorage::new()))
    }

    #[tokio::test]
    async fn test_live_detail_caches_description() {
        let cache = cache();
        cache.save(&top_ten());
        let provider = MockProvider::new();
        provider.set_detail(detail("bitcoin", "Peer-to-peer cash."));

        let view = load_detail("bitcoin", &provider, &cache).await;

        assert!(matches!(view, DetailView::Live(_)));
        assert_eq!(view.coin().unwrap().market_data.market_cap_rank, Some(25));
        assert_eq!(
            cache.get().unwrap()[0].description.as_deref(),
            Some("Peer-to-peer cash.")
        );
    }

    #[tokio::test]
    async fn test_not_found_skips_cache() {
        let cache = cache();
        cache.save(&top_ten());
        let provider = MockProvider::new();

        let view = load_detail("bitcoin", &provider, &cache).await;

        assert_eq!(view, DetailView::NotFound);
        assert!(view.coin().is_none());
    }

    #[tokio::test]
    async fn test_failure_uses_cached_detail() {
        let cache = cache();
        cache.save(&top_ten());
        cache.update_description(&detail("ethereum", "World computer."));
        let provider = MockProvider::new();
        provider.set_detail_error(
            "ethereum",
            CoinGeckoError::new(ErrorKind::Timeout, "Request timeout."),
        );

        let view = load_detail("ethereum", &provider, &cache).await;

        assert!(view.is_cached());
        let coin = view.coin().unwrap();
        assert_eq!(coin.description.en, "World computer.");
        assert_eq!(coin.market_data.market_cap_rank, None);
    }

    #[tokio::test]
    async fn test_failure_without_cache_shows_banner() {
        let cache = CoinCache::detached();
        let provider = MockProvider::new();
        provider.set_detail_error(
            "ethereum",
            CoinGeckoError::new(ErrorKind::RateLimited, "API rate limit exceeded.")
                .with_status(429),
        );

        match load_detail("ethereum", &provider, &cache).await {
            DetailView::Failed(banner) => {
                assert!(banner.rate_limited);
                assert_eq!(banner.reset_at, None);
            }
            other => panic!("expected failure banner, got {:?}", other),
        }
    }
}
