//! Types for the CryptoQuick client

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Decodes `null` as the type's default instead of failing
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Flat summary record for one coin, as shown on the list view
///
/// This is also the shape persisted in the coin-list cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coin {
    /// CoinGecko identifier (e.g. "bitcoin")
    pub id: String,
    pub name: String,
    /// Ticker symbol, upper-cased
    pub symbol: String,
    /// Price in USD
    pub current_price: f64,
    /// 24h price change percentage
    pub price_change_percentage_24h: f64,
    /// Logo URL
    pub image: String,
    /// Market capitalization in USD
    pub market_cap: f64,
    /// Description picked up from a detail page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Coin {
    /// Returns the description if it carries any text
    pub fn description_text(&self) -> Option<&str> {
        self.description.as_deref().filter(|d| !d.is_empty())
    }

    /// Builds a list record from a detail payload
    ///
    /// The large image is used as the single logo.
    pub fn from_detail(detail: &CoinDetail) -> Self {
        Self {
            id: detail.id.clone(),
            name: detail.name.clone(),
            symbol: detail.symbol.to_uppercase(),
            current_price: detail.market_data.current_price.usd,
            price_change_percentage_24h: detail.market_data.price_change_percentage_24h,
            image: detail.image.large.clone(),
            market_cap: detail.market_data.market_cap.usd,
            description: detail.description_text().map(str::to_string),
        }
    }
}

/// Raw record returned by `/coins/markets`
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MarketRecord {
    id: String,
    name: String,
    symbol: String,
    #[serde(default, deserialize_with = "null_as_default")]
    current_price: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    price_change_percentage_24h: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    image: String,
    #[serde(default, deserialize_with = "null_as_default")]
    market_cap: f64,
}

impl From<MarketRecord> for Coin {
    fn from(record: MarketRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            symbol: record.symbol.to_uppercase(),
            current_price: record.current_price,
            price_change_percentage_24h: record.price_change_percentage_24h,
            image: record.image,
            market_cap: record.market_cap,
            description: None,
        }
    }
}

/// Image URLs at the three resolutions CoinGecko serves
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoinImages {
    #[serde(default, deserialize_with = "null_as_default")]
    pub thumb: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub small: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub large: String,
}

/// Localized description; only English is kept
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Description {
    #[serde(default, deserialize_with = "null_as_default")]
    pub en: String,
}

/// A value quoted in USD
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UsdValue {
    #[serde(default, deserialize_with = "null_as_default")]
    pub usd: f64,
}

/// Nested market block of a coin detail
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketData {
    #[serde(default)]
    pub current_price: UsdValue,
    #[serde(default)]
    pub market_cap: UsdValue,
    /// Rank by market cap; `None` when unknown
    #[serde(default)]
    pub market_cap_rank: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub price_change_percentage_24h: f64,
}

/// Expanded record for the detail view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinDetail {
    pub id: String,
    pub name: String,
    pub symbol: String,
    #[serde(default)]
    pub image: CoinImages,
    #[serde(default)]
    pub description: Description,
    #[serde(default)]
    pub market_data: MarketData,
}

impl CoinDetail {
    /// Returns the English description if it carries any text
    pub fn description_text(&self) -> Option<&str> {
        Some(self.description.en.as_str()).filter(|d| !d.is_empty())
    }

    /// Rebuilds a detail record from a cached list entry
    ///
    /// The cache only keeps one logo, so it fills every resolution. The rank is
    /// not cached and is reported as unknown.
    pub fn from_cached(coin: &Coin) -> Self {
        Self {
            id: coin.id.clone(),
            name: coin.name.clone(),
            symbol: coin.symbol.to_lowercase(),
            image: CoinImages {
                thumb: coin.image.clone(),
                small: coin.image.clone(),
                large: coin.image.clone(),
            },
            description: Description {
                en: coin.description.clone().unwrap_or_default(),
            },
            market_data: MarketData {
                current_price: UsdValue {
                    usd: coin.current_price,
                },
                market_cap: UsdValue {
                    usd: coin.market_cap,
                },
                market_cap_rank: None,
                price_change_percentage_24h: coin.price_change_percentage_24h,
            },
        }
    }
}

/// A coin together with its 1-based position in the ranked list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCoin {
    #[serde(flatten)]
    pub coin: Coin,
    pub rank: u32,
}

/// Neighbours of a coin in rank order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdjacentCoins {
    pub previous: Option<RankedCoin>,
    pub next: Option<RankedCoin>,
}

/// Overall health status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    /// Fresh data is flowing
    Healthy,
    /// Running on cached data or seeing failures
    Degraded,
    /// No data at all
    Unhealthy,
}

/// Component health information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    /// Component name
    pub name: String,
    /// Component status
    pub status: HealthStatus,
    /// Optional status message
    pub message: Option<String>,
    /// Component-specific details
    pub details: std::collections::HashMap<String, serde_json::Value>,
    /// Last checked timestamp
    pub last_checked: DateTime<Utc>,
}
