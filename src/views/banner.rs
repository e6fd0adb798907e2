//! Error banner shown when no cached data can stand in for a failed fetch

use crate::{
    error::CoinGeckoError,
    formatters::{format_time_until_reset, format_time_until_reset_at},
};
use chrono::Utc;
use futures::stream::{self, Stream};
use std::time::Duration;

/// Title used for rate-limit failures
pub const RATE_LIMIT_TITLE: &str = "API Rate Limit Exceeded";

/// Title used for every other failure
pub const GENERIC_TITLE: &str = "Error";

const WAIT_HINT: &str = "Please wait a moment before trying again.";

/// User-facing summary of a classified error
///
/// Every banner offers a retry and a way back to the list; those actions
/// belong to the host UI.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorBanner {
    pub title: String,
    pub message: String,
    /// Whether the failure came from rate limiting
    pub rate_limited: bool,
    /// Epoch ms when the rate limit lifts, if the API said so
    pub reset_at: Option<i64>,
}

impl ErrorBanner {
    pub fn from_error(error: &CoinGeckoError) -> Self {
        let rate_limited = error.is_rate_limited();
        Self {
            title: if rate_limited {
                RATE_LIMIT_TITLE
            } else {
                GENERIC_TITLE
            }
            .to_string(),
            message: error.message().to_string(),
            rate_limited,
            reset_at: error.reset_at(),
        }
    }

    /// Retry guidance for rate-limit banners, relative to now
    pub fn retry_hint(&self) -> Option<String> {
        self.retry_hint_at(Utc::now().timestamp_millis())
    }

    /// Retry guidance for rate-limit banners at `now_ms`
    ///
    /// `None` for other failures.
    pub fn retry_hint_at(&self, now_ms: i64) -> Option<String> {
        if !self.rate_limited {
            return None;
        }
        let until = format_time_until_reset_at(self.reset_at, now_ms);
        if until.is_empty() {
            Some(WAIT_HINT.to_string())
        } else {
            Some(format!("You can try again {}.", until))
        }
    }

    /// Time until reset, re-rendered once per second
    ///
    /// Ends after yielding `"now"`. Empty when there is no reset time.
    pub fn countdown(&self) -> impl Stream<Item = String> + Send + 'static {
        let reset_at = self.reset_at;
        stream::unfold(reset_at.map(|_| true), move |state| async move {
            let (first, reset_at) = match (state, reset_at) {
                (Some(first), Some(reset_at)) => (first, reset_at),
                _ => return None,
            };
            if !first {
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
            let text = format_time_until_reset(Some(reset_at));
            let next = if text == "now" { None } else { Some(false) };
            Some((text, next))
        })
    }
}
