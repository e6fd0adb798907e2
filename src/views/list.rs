//! Coin list view model
//!
//! Loads the top coins, falls back to the cache when the API fails, and
//! filters what is shown by search query and favorites. Every load carries a
//! request token; a fetch that resolves after a newer load has started is
//! discarded so stale data never replaces fresh data.

use crate::{
    cache::CoinCache,
    error::CoinGeckoError,
    provider::MarketDataProvider,
    types::Coin,
    views::banner::ErrorBanner,
    watchlist::WatchlistStore,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Title of the notice shown while cached coins stand in for live data
pub const CACHED_NOTICE_TITLE: &str = "Showing cached data";

/// Body of the cached data notice
pub const CACHED_NOTICE_MESSAGE: &str =
    "Unable to fetch fresh data due to API rate limits. Showing previously saved data.";

/// What happened to a load once its fetch resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Live coins are shown
    Fresh,
    /// The fetch failed and cached coins are shown
    Cached,
    /// The fetch failed and there was nothing to fall back on
    Failed,
    /// A newer load started first; the result was dropped
    Superseded,
}

/// Snapshot of the list view
#[derive(Debug, Clone, Default)]
pub struct ListState {
    /// Coins in rank order, before filtering
    pub coins: Vec<Coin>,
    pub loading: bool,
    /// Cached coins are being shown because the last fetch failed
    pub showing_cached: bool,
    /// Banner for a failure with no cached fallback
    pub error: Option<ErrorBanner>,
    /// The error behind the last failed load, even when the cache covered it
    pub last_error: Option<CoinGeckoError>,
    pub query: String,
    pub favorites_only: bool,
}

/// Coin list view model
pub struct CoinListView {
    provider: Arc<dyn MarketDataProvider>,
    cache: Arc<CoinCache>,
    watchlist: Arc<WatchlistStore>,
    state: RwLock<ListState>,
    latest_request: AtomicU64,
}

impl CoinListView {
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        cache: Arc<CoinCache>,
        watchlist: Arc<WatchlistStore>,
    ) -> Self {
        Self {
            provider,
            cache,
            watchlist,
            state: RwLock::new(ListState::default()),
            latest_request: AtomicU64::new(0),
        }
    }

    /// Fetches the top coins and updates the view
    ///
    /// A successful fetch is saved to the cache. A failure shows cached coins
    /// with a notice, or an error banner when nothing is cached.
    pub async fn load(&self) -> LoadOutcome {
        let token = self.latest_request.fetch_add(1, Ordering::SeqCst) + 1;

        {
            let mut state = self.state.write().await;
            state.loading = true;
            state.showing_cached = false;
            state.error = None;
            state.last_error = None;
        }

        let result = self.provider.fetch_top_coins().await;

        let mut state = self.state.write().await;
        if self.latest_request.load(Ordering::SeqCst) != token {
            tracing::debug!(token, "Discarding superseded coin list load");
            return LoadOutcome::Superseded;
        }

        let outcome = match result {
            Ok(coins) => {
                self.cache.save(&coins);
                state.coins = coins;
                LoadOutcome::Fresh
            }
            Err(e) => {
                let outcome = match self.cache.get() {
                    Some(cached) => {
                        tracing::info!(
                            count = cached.len(),
                            kind = %e.kind(),
                            "Showing cached coins after failed fetch"
                        );
                        state.coins = cached;
                        state.showing_cached = true;
                        LoadOutcome::Cached
                    }
                    None => {
                        state.error = Some(ErrorBanner::from_error(&e));
                        LoadOutcome::Failed
                    }
                };
                state.last_error = Some(e);
                outcome
            }
        };

        state.loading = false;
        outcome
    }

    /// Returns a copy of the current state
    pub async fn snapshot(&self) -> ListState {
        self.state.read().await.clone()
    }

    pub async fn set_query(&self, query: impl Into<String>) {
        self.state.write().await.query = query.into();
    }

    pub async fn set_favorites_only(&self, favorites_only: bool) {
        self.state.write().await.favorites_only = favorites_only;
    }

    /// Flips the favorites filter and returns its new value
    pub async fn toggle_favorites_only(&self) -> bool {
        let mut state = self.state.write().await;
        state.favorites_only = !state.favorites_only;
        state.favorites_only
    }

    /// Coins after the favorites filter and the search query
    pub async fn visible_coins(&self) -> Vec<Coin> {
        let state = self.state.read().await;
        let watchlist = if state.favorites_only {
            self.watchlist.get()
        } else {
            Vec::new()
        };
        filter_coins(&state.coins, &state.query, state.favorites_only, &watchlist)
    }

    /// Message for an empty filtered list, `None` when something is visible
    /// or the view is loading or failed
    pub async fn empty_message(&self) -> Option<String> {
        let visible = self.visible_coins().await;
        let state = self.state.read().await;
        if !visible.is_empty() || state.loading || state.error.is_some() {
            return None;
        }
        if state.favorites_only {
            Some("No favorite coins found.".to_string())
        } else {
            Some(format!("No coins found matching \"{}\"", state.query))
        }
    }
}

/// Applies the favorites filter, then a case-insensitive name/symbol search
pub fn filter_coins(
    coins: &[Coin],
    query: &str,
    favorites_only: bool,
    watchlist: &[String],
) -> Vec<Coin> {
    let query = query.trim().to_lowercase();

    coins
        .iter()
        .filter(|coin| !favorites_only || watchlist.iter().any(|id| *id == coin.id))
        .filter(|coin| {
            query.is_empty()
                || coin.name.to_lowercase().contains(&query)
                || coin.symbol.to_lowercase().contains(&query)
        })
        .cloned()
        .collect()
}
