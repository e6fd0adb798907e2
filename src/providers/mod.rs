//! Market data provider implementations

pub mod coingecko;
pub mod metered;

pub use coingecko::CoinGeckoProvider;
pub use metered::MeteredProvider;
