use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// One day of OHLCV data as returned by a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: BigDecimal,
    pub high: BigDecimal,
    pub low: BigDecimal,
    pub close: BigDecimal,
    pub volume: i64,
}

#[derive(Debug, Error)]
pub enum QuoteProviderError {
    #[error("provider not configured")]
    NotConfigured,

    #[error("network error: {0}")]
    Network(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("rate limited")]
    RateLimited,
}

/// External source of live quotes and daily history. Every error it can return
/// is absorbed by the market-data gateway's fallback ladder; nothing here
/// reaches a caller of the service.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Human-readable source name, used to label response envelopes.
    fn name(&self) -> &'static str;

    fn is_configured(&self) -> bool;

    async fn fetch_quote(&self, symbol: &str) -> Result<BigDecimal, QuoteProviderError>;

    /// Daily bars, oldest first, at most `days` entries.
    async fn fetch_daily_series(
        &self,
        symbol: &str,
        days: u32,
    ) -> Result<Vec<DailyBar>, QuoteProviderError>;
}
