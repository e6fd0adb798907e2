//! # CryptoQuick SDK
//!
//! Core of a top-10 cryptocurrency dashboard: a CoinGecko client that
//! classifies every failure into one error type, a watchlist, an offline
//! cache of the ranked coin list, previous/next navigation and display
//! formatting. Rendering is left to the host.
//!
//! ## Usage
//!
//! ```no_run
//! use cryptoquick_sdk::{formatters::format_price, Dashboard, LoadOutcome};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let dashboard = Dashboard::global().await?;
//!
//! match dashboard.load_coins().await {
//!     LoadOutcome::Cached => println!("Showing cached data"),
//!     LoadOutcome::Failed => {
//!         let state = dashboard.list().snapshot().await;
//!         if let Some(banner) = state.error {
//!             eprintln!("{}: {}", banner.title, banner.message);
//!         }
//!     }
//!     _ => {}
//! }
//!
//! for coin in dashboard.list().visible_coins().await {
//!     println!("{:<6} {}", coin.symbol, format_price(coin.current_price));
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! ```no_run
//! use cryptoquick_sdk::{ClientConfig, CoinGeckoProvider, ErrorKind, MarketDataProvider};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = CoinGeckoProvider::new(&ClientConfig::default())?;
//!
//! match provider.fetch_coin_detail("bitcoin").await {
//!     Ok(detail) => println!("{}", detail.name),
//!     Err(e) if e.is_not_found() => println!("No such coin"),
//!     Err(e) if e.kind() == ErrorKind::RateLimited => {
//!         println!("Rate limited until {:?}", e.reset_at())
//!     }
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod constants;
pub mod dashboard;
pub mod error;
pub mod formatters;
pub mod metrics;
pub mod navigation;
pub mod notify;
pub mod provider;
pub mod providers;
pub mod storage;
pub mod types;
pub mod views;
pub mod watchlist;

// Re-export commonly used types
pub use cache::CoinCache;
pub use config::ClientConfig;
pub use dashboard::Dashboard;
pub use error::{CoinGeckoError, ErrorKind, StorageError};
pub use metrics::RequestMetrics;
pub use notify::{ChangeOrigin, StorageChange, Subscription};
pub use provider::MarketDataProvider;
pub use providers::{CoinGeckoProvider, MeteredProvider};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};
pub use types::{
    AdjacentCoins, Coin, CoinDetail, ComponentHealth, HealthStatus, RankedCoin,
};
pub use views::{CoinListView, DetailView, ErrorBanner, ListState, LoadOutcome};
pub use watchlist::WatchlistStore;
