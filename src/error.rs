//! Error types for the CryptoQuick client

use std::fmt;
use thiserror::Error;

/// What went wrong with a CoinGecko request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// HTTP 429
    RateLimited,
    /// HTTP 403 or 503, usually a rate limit in disguise
    Unavailable,
    /// Any other non-success status
    Api,
    /// The request did not complete within the client timeout
    Timeout,
    /// The request never reached the API
    Network,
    /// Anything that could not be classified
    Unknown,
}

impl ErrorKind {
    /// Label used in logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::Unavailable => "unavailable",
            ErrorKind::Api => "api",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Network => "network",
            ErrorKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified CoinGecko failure
///
/// Values are only built by the classification functions in
/// `providers::coingecko`, so callers can match on `kind()` without
/// inspecting messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CoinGeckoError {
    kind: ErrorKind,
    message: String,
    status_code: Option<u16>,
    reset_at: Option<i64>,
}

impl CoinGeckoError {
    pub(crate) fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status_code: None,
            reset_at: None,
        }
    }

    pub(crate) fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    pub(crate) fn with_reset_at(mut self, reset_at: Option<i64>) -> Self {
        self.reset_at = reset_at;
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// HTTP status of the failed response, if there was one
    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    /// Epoch milliseconds after which the rate limit should be lifted
    pub fn reset_at(&self) -> Option<i64> {
        self.reset_at
    }

    /// True for 429 and for the 403/503 responses CoinGecko sends when throttling
    pub fn is_rate_limited(&self) -> bool {
        matches!(self.kind, ErrorKind::RateLimited | ErrorKind::Unavailable)
    }

    /// True when the requested coin does not exist
    pub fn is_not_found(&self) -> bool {
        self.status_code == Some(404)
    }
}

/// Errors raised by storage backends
///
/// These never leave the persistence stores: `WatchlistStore` and `CoinCache`
/// log them and fall back to empty results.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing medium failed
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored value could not be encoded or decoded
    #[error("Malformed stored value: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backend refused the operation
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    /// Creates an Unavailable error
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_kinds() {
        let limited = CoinGeckoError::new(ErrorKind::RateLimited, "slow down").with_status(429);
        let unavailable = CoinGeckoError::new(ErrorKind::Unavailable, "503").with_status(503);
        let timeout = CoinGeckoError::new(ErrorKind::Timeout, "timeout");

        assert!(limited.is_rate_limited());
        assert!(unavailable.is_rate_limited());
        assert!(!timeout.is_rate_limited());
    }

    #[test]
    fn test_not_found_is_status_based() {
        let missing = CoinGeckoError::new(ErrorKind::Api, "API request failed: Not Found")
            .with_status(404);
        assert!(missing.is_not_found());
        assert_eq!(missing.kind(), ErrorKind::Api);
        assert_eq!(missing.to_string(), "API request failed: Not Found");
    }
}
