use bigdecimal::BigDecimal;
use serde::Serialize;

use crate::external::quote_provider::DailyBar;

#[derive(Debug, Serialize)]
pub struct StockPriceResponse {
    pub symbol: String,
    pub price: BigDecimal,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

// Historical series envelope. `data_source` tells the consumer whether the
// points came from the quote provider or from the synthetic fallback walk.
#[derive(Debug, Serialize)]
pub struct StockHistoryResponse {
    pub symbol: String,
    pub data_source: String,
    pub points: Vec<DailyBar>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub price_entries: usize,
    pub fresh_price_entries: usize,
    pub history_entries: usize,
}

#[derive(Debug, Serialize)]
pub struct MarketStatus {
    pub status: &'static str,
    pub provider: &'static str,
    pub provider_configured: bool,
    pub cache: CacheStats,
    pub mock_symbols: usize,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}
