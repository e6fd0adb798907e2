//! Provider wrapper that records request metrics

use crate::{
    error::CoinGeckoError,
    metrics::{MetricsCollector, RequestMetrics},
    provider::MarketDataProvider,
    types::{Coin, CoinDetail},
};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

/// Wraps another provider and records the latency and outcome of every call
///
/// Errors pass through untouched.
pub struct MeteredProvider {
    inner: Arc<dyn MarketDataProvider>,
    metrics: Arc<MetricsCollector>,
}

impl MeteredProvider {
    pub fn new(inner: Arc<dyn MarketDataProvider>) -> Self {
        let metrics = Arc::new(MetricsCollector::new(inner.provider_name()));
        Self { inner, metrics }
    }

    /// Current metrics of the wrapped provider
    pub async fn metrics(&self) -> RequestMetrics {
        self.metrics.snapshot().await
    }

    async fn observe<T>(&self, start: Instant, result: &Result<T, CoinGeckoError>) {
        match result {
            Ok(_) => self.metrics.record_success(start.elapsed()).await,
            Err(e) => {
                tracing::warn!(
                    provider = self.inner.provider_name(),
                    kind = %e.kind(),
                    status = ?e.status_code(),
                    latency_ms = start.elapsed().as_millis() as u64,
                    error = %e,
                    "Market data request failed"
                );
                self.metrics.record_failure(e).await;
            }
        }
    }
}

#[async_trait]
impl MarketDataProvider for MeteredProvider {
    async fn fetch_top_coins(&self) -> Result<Vec<Coin>, CoinGeckoError> {
        let start = Instant::now();
        let result = self.inner.fetch_top_coins().await;
        self.observe(start, &result).await;
        result
    }

    async fn fetch_coin_detail(&self, id: &str) -> Result<CoinDetail, CoinGeckoError> {
        let start = Instant::now();
        let result = self.inner.fetch_coin_detail(id).await;
        self.observe(start, &result).await;
        result
    }

    fn provider_name(&self) -> &'static str {
        self.inner.provider_name()
    }
}
