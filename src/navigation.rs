//! Previous/next navigation between coins in rank order

use crate::{
    cache::CoinCache,
    provider::MarketDataProvider,
    types::{AdjacentCoins, Coin, RankedCoin},
};

/// Finds the neighbours of `id` in the most recently known ranking
///
/// The cached list is preferred. Without one, the top coins are fetched live;
/// a failed fetch yields no neighbours rather than an error.
pub async fn adjacent_coins(
    id: &str,
    cache: &CoinCache,
    provider: &dyn MarketDataProvider,
) -> AdjacentCoins {
    let coins = match cache.get() {
        Some(coins) => coins,
        None => match provider.fetch_top_coins().await {
            Ok(coins) => coins,
            Err(e) => {
                tracing::debug!(id, error = %e, "No coin list available for navigation");
                return AdjacentCoins::default();
            }
        },
    };

    adjacent_in(&coins, id)
}

/// Finds the neighbours of `id` in `coins`, ranking from 1
pub fn adjacent_in(coins: &[Coin], id: &str) -> AdjacentCoins {
    let Some(index) = coins.iter().position(|coin| coin.id == id) else {
        return AdjacentCoins::default();
    };

    let ranked = |i: usize| RankedCoin {
        coin: coins[i].clone(),
        rank: i as u32 + 1,
    };

    AdjacentCoins {
        previous: index.checked_sub(1).map(ranked),
        next: (index + 1 < coins.len()).then(|| ranked(index + 1)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CoinGeckoError, ErrorKind};
    use crate::provider::mock::{top_ten, MockProvider};
    use crate::storage::MemoryStorage;
    use std::sync::Arc;

    #[test]
    fn test_first_coin_has_only_next() {
        let coins = top_ten();
        let adjacent = adjacent_in(&coins, "bitcoin");

        assert!(adjacent.previous.is_none());
        let next = adjacent.next.unwrap();
        assert_eq!(next.coin.id, "ethereum");
        assert_eq!(next.rank, 2);
    }

    #[test]
    fn test_last_coin_has_only_previous() {
        let coins = top_ten();
        let adjacent = adjacent_in(&coins, "tron");

        assert!(adjacent.next.is_none());
        let previous = adjacent.previous.unwrap();
        assert_eq!(previous.coin.id, "dogecoin");
        assert_eq!(previous.rank, 9);
    }

    #[test]
    fn test_middle_coin_ranks_are_one_based() {
        let coins = top_ten();
        let adjacent = adjacent_in(&coins, "solana");

        assert_eq!(adjacent.previous.as_ref().unwrap().rank, 4);
        assert_eq!(adjacent.previous.unwrap().coin.id, "binancecoin");
        assert_eq!(adjacent.next.as_ref().unwrap().rank, 6);
        assert_eq!(adjacent.next.unwrap().coin.id, "ripple");
    }

    #[test]
    fn test_unknown_id_has_no_neighbours() {
        assert_eq!(adjacent_in(&top_ten(), "nope"), AdjacentCoins::default());
        assert_eq!(adjacent_in(&[], "bitcoin"), AdjacentCoins::default());
    }

    #[tokio::test]
    async fn test_prefers_cache_over_fetch() {
        let cache = CoinCache::new(Arc::new(MemoryStorage::new()));
        cache.save(&top_ten());
        let provider = MockProvider::new();

        let adjacent = adjacent_coins("ethereum", &cache, &provider).await;

        assert_eq!(adjacent.previous.unwrap().coin.id, "bitcoin");
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_falls_back_to_live_fetch() {
        let cache = CoinCache::detached();
        let provider = MockProvider::new();
        provider.set_top_coins(top_ten());

        let adjacent = adjacent_coins("tether", &cache, &provider).await;

        assert_eq!(adjacent.next.unwrap().rank, 4);
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_yields_no_neighbours() {
        let cache = CoinCache::detached();
        let provider = MockProvider::new();
        provider.set_top_coins_error(
            CoinGeckoError::new(ErrorKind::RateLimited, "limited").with_status(429),
        );

        let adjacent = adjacent_coins("bitcoin", &cache, &provider).await;

        assert_eq!(adjacent, AdjacentCoins::default());
    }
}
