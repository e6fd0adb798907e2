//! Provider abstraction for fetching market data from external APIs

use crate::{
    error::CoinGeckoError,
    types::{Coin, CoinDetail},
};
use async_trait::async_trait;

/// Trait for market data providers
///
/// Every failure comes back already classified; callers never re-wrap it.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Fetches the top coins by market capitalization, highest first
    ///
    /// # Returns
    /// Coins in API order with upper-cased symbols
    async fn fetch_top_coins(&self) -> Result<Vec<Coin>, CoinGeckoError>;

    /// Fetches the detail record of a single coin
    ///
    /// # Arguments
    /// * `id` - CoinGecko identifier (e.g. "bitcoin")
    ///
    /// # Returns
    /// The detail exactly as served. A missing coin fails with status 404.
    async fn fetch_coin_detail(&self, id: &str) -> Result<CoinDetail, CoinGeckoError>;

    /// Returns the name of this provider
    fn provider_name(&self) -> &'static str;
}
