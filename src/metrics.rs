//! Request metrics for market data providers
//!
//! Keeps a rolling window of request latencies plus lifetime counters broken
//! down by failure kind, so the dashboard can tell a slow API from a
//! throttled one.

use crate::error::{CoinGeckoError, ErrorKind};
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tokio::sync::RwLock;

/// Maximum number of samples to keep for latency percentiles
const MAX_SAMPLES: usize = 100;

/// Snapshot of request metrics
#[derive(Debug, Clone)]
pub struct RequestMetrics {
    /// Name of the provider
    pub provider_name: String,
    /// 50th percentile latency of successful requests in milliseconds
    pub latency_p50_ms: f64,
    /// 99th percentile latency of successful requests in milliseconds
    pub latency_p99_ms: f64,
    /// Success rate (0.0 to 1.0)
    pub success_rate: f64,
    /// Total number of requests
    pub total_requests: u64,
    /// Number of failed requests
    pub failed_requests: u64,
    /// Failed requests per error kind
    pub failures_by_kind: HashMap<ErrorKind, u64>,
    /// Most recent rate-limit reset time seen (epoch ms)
    pub last_reset_at: Option<i64>,
}

impl RequestMetrics {
    /// Number of requests rejected by rate limiting (429, 403, 503)
    pub fn rate_limited_requests(&self) -> u64 {
        [ErrorKind::RateLimited, ErrorKind::Unavailable]
            .iter()
            .filter_map(|kind| self.failures_by_kind.get(kind))
            .sum()
    }
}

#[derive(Debug, Default)]
struct MetricsState {
    /// Latencies of recent successful requests
    latencies_ms: VecDeque<f64>,
    total: u64,
    failed: u64,
    failures_by_kind: HashMap<ErrorKind, u64>,
    last_reset_at: Option<i64>,
}

/// Collects request outcomes for one provider
pub struct MetricsCollector {
    provider_name: String,
    state: RwLock<MetricsState>,
}

impl MetricsCollector {
    /// Creates a new metrics collector for a provider
    pub fn new(provider_name: &str) -> Self {
        Self {
            provider_name: provider_name.to_string(),
            state: RwLock::new(MetricsState {
                latencies_ms: VecDeque::with_capacity(MAX_SAMPLES),
                ..MetricsState::default()
            }),
        }
    }

    /// Records a successful request
    pub async fn record_success(&self, duration: Duration) {
        let mut state = self.state.write().await;
        state.total += 1;
        if state.latencies_ms.len() >= MAX_SAMPLES {
            state.latencies_ms.pop_front();
        }
        state.latencies_ms.push_back(duration.as_secs_f64() * 1000.0);
    }

    /// Records a failed request
    pub async fn record_failure(&self, error: &CoinGeckoError) {
        let mut state = self.state.write().await;
        state.total += 1;
        state.failed += 1;
        *state.failures_by_kind.entry(error.kind()).or_insert(0) += 1;
        if let Some(reset_at) = error.reset_at() {
            state.last_reset_at = Some(reset_at);
        }
    }

    /// Computes a snapshot of the collected metrics
    pub async fn snapshot(&self) -> RequestMetrics {
        let state = self.state.read().await;

        let mut latencies: Vec<f64> = state.latencies_ms.iter().copied().collect();
        latencies.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let success_rate = if state.total > 0 {
            (state.total - state.failed) as f64 / state.total as f64
        } else {
            1.0
        };

        RequestMetrics {
            provider_name: self.provider_name.clone(),
            latency_p50_ms: percentile(&latencies, 50.0),
            latency_p99_ms: percentile(&latencies, 99.0),
            success_rate,
            total_requests: state.total,
            failed_requests: state.failed,
            failures_by_kind: state.failures_by_kind.clone(),
            last_reset_at: state.last_reset_at,
        }
    }
}

/// Calculate percentile from sorted values
fn percentile(sorted_values: &[f64], p: f64) -> f64 {
    if sorted_values.is_empty() {
        return 0.0;
    }

    let idx = (p / 100.0 * (sorted_values.len() - 1) as f64).round() as usize;
    sorted_values[idx.min(sorted_values.len() - 1)]
}
