//! CoinGecko market data provider and error classification

use crate::{
    config::ClientConfig,
    constants::{
        COINGECKO_COIN_ENDPOINT, COINGECKO_MARKETS_ENDPOINT, MARKETS_ORDER,
        NETWORK_FAILURE_PATTERNS, TOP_COINS_PER_PAGE, USER_AGENT, VS_CURRENCY,
    },
    error::{CoinGeckoError, ErrorKind},
    provider::MarketDataProvider,
    types::{Coin, CoinDetail, MarketRecord},
};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, RETRY_AFTER},
    Client, StatusCode, Url,
};
use serde::de::DeserializeOwned;

const RATE_LIMITED_MESSAGE: &str = "API rate limit exceeded. Please try again later.";
const UNAVAILABLE_MESSAGE: &str =
    "API rate limit exceeded or service unavailable. Please try again later.";
const TIMEOUT_MESSAGE: &str =
    "Request timeout. The API might be rate limiting. Please wait a moment and try again.";
const NETWORK_MESSAGE: &str = "Network error. This might be due to API rate limiting. \
     Wait 60 seconds until the rate limit resets and try again.";

/// Classifies an HTTP status
///
/// Returns `None` for success. `now_ms` anchors the reset time derived from a
/// `Retry-After` header (seconds).
pub(crate) fn classify_status(
    status: StatusCode,
    retry_after: Option<&str>,
    now_ms: i64,
) -> Option<CoinGeckoError> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        let reset_at = retry_after
            .and_then(retry_after_secs)
            .and_then(|secs| secs.checked_mul(1000))
            .and_then(|ms| now_ms.checked_add(ms));
        return Some(
            CoinGeckoError::new(ErrorKind::RateLimited, RATE_LIMITED_MESSAGE)
                .with_status(status.as_u16())
                .with_reset_at(reset_at),
        );
    }

    if status.is_success() {
        return None;
    }

    if status == StatusCode::FORBIDDEN || status == StatusCode::SERVICE_UNAVAILABLE {
        return Some(
            CoinGeckoError::new(ErrorKind::Unavailable, UNAVAILABLE_MESSAGE)
                .with_status(status.as_u16()),
        );
    }

    let reason = status.canonical_reason().unwrap_or("Unknown status");
    Some(
        CoinGeckoError::new(ErrorKind::Api, format!("API request failed: {}", reason))
            .with_status(status.as_u16()),
    )
}

/// Leading decimal digits of a `Retry-After` value, so `"30.5"` and `"30s"`
/// both read as 30. HTTP dates and out-of-range values yield `None`.
fn retry_after_secs(value: &str) -> Option<i64> {
    let value = value.trim_start();
    let end = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    value[..end].parse().ok()
}

/// Classifies a failure that produced no usable HTTP response
pub(crate) fn classify_transport(err: &reqwest::Error) -> CoinGeckoError {
    if err.is_timeout() {
        return CoinGeckoError::new(ErrorKind::Timeout, TIMEOUT_MESSAGE);
    }
    classify_failure_message(&error_chain(err), err.is_connect())
}

/// Classifies a transport failure by its message
pub(crate) fn classify_failure_message(message: &str, is_connect: bool) -> CoinGeckoError {
    let looks_like_network = is_connect
        || NETWORK_FAILURE_PATTERNS
            .iter()
            .any(|pattern| message.contains(pattern));

    if looks_like_network {
        CoinGeckoError::new(ErrorKind::Network, NETWORK_MESSAGE)
    } else if message.is_empty() {
        CoinGeckoError::new(ErrorKind::Unknown, "An unknown error occurred")
    } else {
        CoinGeckoError::new(ErrorKind::Unknown, message)
    }
}

/// Flattens an error and its sources into one line
fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// CoinGecko market data provider
pub struct CoinGeckoProvider {
    client: Client,
    base_url: Url,
}

impl CoinGeckoProvider {
    /// Creates a provider from configuration
    pub fn new(config: &ClientConfig) -> Result<Self, CoinGeckoError> {
        let base_url = Url::parse(&config.api_base_url).map_err(|e| {
            CoinGeckoError::new(
                ErrorKind::Unknown,
                format!("Invalid API base URL {:?}: {}", config.api_base_url, e),
            )
        })?;
        if base_url.cannot_be_a_base() {
            return Err(CoinGeckoError::new(
                ErrorKind::Unknown,
                format!("Invalid API base URL {:?}", config.api_base_url),
            ));
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|e| classify_transport(&e))?;

        Ok(Self { client, base_url })
    }

    /// Builds `{base}/coins/markets` with the fixed top-10 query
    pub(crate) fn markets_url(&self) -> Url {
        let mut url = self.endpoint(&[COINGECKO_MARKETS_ENDPOINT]);
        url.query_pairs_mut()
            .append_pair("vs_currency", VS_CURRENCY)
            .append_pair("order", MARKETS_ORDER)
            .append_pair("per_page", &TOP_COINS_PER_PAGE.to_string())
            .append_pair("page", "1");
        url
    }

    /// Builds `{base}/coins/{id}`, escaping the id as one path segment
    pub(crate) fn detail_url(&self, id: &str) -> Url {
        self.endpoint(&[COINGECKO_COIN_ENDPOINT, id])
    }

    fn endpoint(&self, parts: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Checked in `new`
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty();
            for part in parts {
                if part.starts_with('/') {
                    segments.extend(part.split('/').filter(|s| !s.is_empty()));
                } else {
                    segments.push(part);
                }
            }
        }
        url
    }

    /// Performs a GET and decodes the JSON body, classifying any failure
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, CoinGeckoError> {
        tracing::debug!(url = %url, "Requesting CoinGecko");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| classify_transport(&e))?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok());

        if let Some(err) = classify_status(status, retry_after, Utc::now().timestamp_millis()) {
            tracing::warn!(
                url = %url,
                status = status.as_u16(),
                kind = %err.kind(),
                reset_at = ?err.reset_at(),
                "CoinGecko request failed"
            );
            return Err(err);
        }

        let body = response.text().await.map_err(|e| classify_transport(&e))?;

        serde_json::from_str(&body).map_err(|e| {
            CoinGeckoError::new(
                ErrorKind::Unknown,
                format!("Failed to parse CoinGecko response: {}", e),
            )
        })
    }
}

#[async_trait]
impl MarketDataProvider for CoinGeckoProvider {
    async fn fetch_top_coins(&self) -> Result<Vec<Coin>, CoinGeckoError> {
        let records: Vec<MarketRecord> = self.get_json(self.markets_url()).await?;
        let coins: Vec<Coin> = records.into_iter().map(Coin::from).collect();

        tracing::debug!(count = coins.len(), "Fetched top coins from CoinGecko");

        Ok(coins)
    }

    async fn fetch_coin_detail(&self, id: &str) -> Result<CoinDetail, CoinGeckoError> {
        let detail: CoinDetail = self.get_json(self.detail_url(id)).await?;

        tracing::debug!(id, "Fetched coin detail from CoinGecko");

        Ok(detail)
    }

    fn provider_name(&self) -> &'static str {
        "coingecko"
    }
}
