//! Constants for the CryptoQuick client
//!
//! Defaults for everything the client talks to live here. `ClientConfig`
//! (see `config.rs`) starts from these values and only overrides a few of
//! them from the environment.

/// HTTP request timeout for every CoinGecko call (in seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Number of coins shown on the list view
pub const TOP_COINS_PER_PAGE: u32 = 10;

/// CoinGecko API base URL
pub const COINGECKO_API_URL: &str = "https://api.coingecko.com/api/v3";

/// CoinGecko endpoint for ranked market records
pub const COINGECKO_MARKETS_ENDPOINT: &str = "/coins/markets";

/// CoinGecko endpoint prefix for a single coin detail
pub const COINGECKO_COIN_ENDPOINT: &str = "/coins";

/// Quote currency for every market request
pub const VS_CURRENCY: &str = "usd";

/// Ordering of the markets listing
pub const MARKETS_ORDER: &str = "market_cap_desc";

/// Storage key holding the cached ranked coin list
pub const COINS_CACHE_KEY: &str = "cryptoquick_coins_cache";

/// Storage key holding the watchlist
pub const WATCHLIST_STORAGE_KEY: &str = "cryptoquick_watchlist";

/// User agent for HTTP requests
pub const USER_AGENT: &str = "cryptoquick-sdk/0.1.0";

/// Transport error fragments that indicate the request never reached the API
pub const NETWORK_FAILURE_PATTERNS: &[&str] = &[
    "fetch",
    "NetworkError",
    "error sending request",
    "connection refused",
    "connection reset",
    "dns error",
];

/// Capacity of the change notification channels
pub const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Environment variable overriding the API base URL
pub const API_URL_ENV: &str = "CRYPTOQUICK_API_URL";

/// Environment variable selecting a directory for persistent storage
pub const STORAGE_DIR_ENV: &str = "CRYPTOQUICK_STORAGE_DIR";
