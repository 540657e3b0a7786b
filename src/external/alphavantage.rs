use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::external::quote_provider::{DailyBar, QuoteProvider, QuoteProviderError};

const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co/query";

pub struct AlphaVantageProvider {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl AlphaVantageProvider {
    /// Reads ALPHAVANTAGE_API_KEY / ALPHAVANTAGE_BASE_URL. A missing or
    /// placeholder key is not an error here: fetches will return
    /// `NotConfigured` and the gateway falls through to its cache/mock ladder.
    pub fn from_env(timeout: Duration) -> Self {
        let api_key = std::env::var("ALPHAVANTAGE_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty() && k != "YOUR_API_KEY");
        let base_url = std::env::var("ALPHAVANTAGE_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            api_key,
            base_url,
        }
    }

    fn key(&self) -> Result<&str, QuoteProviderError> {
        self.api_key
            .as_deref()
            .ok_or(QuoteProviderError::NotConfigured)
    }
}

#[derive(Debug, Deserialize)]
struct AvQuoteResponse {
    #[serde(rename = "Global Quote")]
    global_quote: Option<AvGlobalQuote>,

    // When rate-limited Alpha Vantage returns:
    // { "Note": "Thank you for using Alpha Vantage! ... 5 calls per minute ..." }
    #[serde(rename = "Note")]
    note: Option<String>,

    // When invalid:
    // { "Error Message": "Invalid API call. ..." }
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AvGlobalQuote {
    #[serde(rename = "05. price")]
    price: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AvDailyResponse {
    #[serde(rename = "Time Series (Daily)")]
    time_series: Option<BTreeMap<String, AvDailyBar>>,

    #[serde(rename = "Note")]
    note: Option<String>,

    #[serde(rename = "Error Message")]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AvDailyBar {
    #[serde(rename = "1. open")]
    open: Option<String>,
    #[serde(rename = "2. high")]
    high: Option<String>,
    #[serde(rename = "3. low")]
    low: Option<String>,
    #[serde(rename = "4. close")]
    close: String,
    #[serde(rename = "5. volume")]
    volume: Option<String>,
}

// The provider omits OHLC fields on some thinly traded symbols; treat those
// as zero the way the close is never allowed to be.
fn parse_decimal_or_zero(value: Option<&str>) -> BigDecimal {
    value
        .and_then(|v| BigDecimal::from_str(v.trim()).ok())
        .unwrap_or_else(|| BigDecimal::from(0))
}

#[async_trait]
impl QuoteProvider for AlphaVantageProvider {
    fn name(&self) -> &'static str {
        "Alpha Vantage"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<BigDecimal, QuoteProviderError> {
        let api_key = self.key()?;

        let resp = self
            .client
            .get(&self.base_url)
            .query(&[
                ("function", "GLOBAL_QUOTE"),
                ("symbol", symbol),
                ("apikey", api_key),
            ])
            .send()
            .await
            .map_err(|e| QuoteProviderError::Network(e.to_string()))?;

        let body = resp
            .json::<AvQuoteResponse>()
            .await
            .map_err(|e| QuoteProviderError::Parse(e.to_string()))?;

        if body.note.is_some() {
            return Err(QuoteProviderError::RateLimited);
        }
        if let Some(msg) = body.error_message {
            return Err(QuoteProviderError::BadResponse(msg));
        }

        let price_str = body
            .global_quote
            .and_then(|q| q.price)
            .ok_or_else(|| QuoteProviderError::BadResponse("missing price field".into()))?;

        BigDecimal::from_str(price_str.trim())
            .map_err(|e| QuoteProviderError::Parse(format!("invalid price {price_str:?}: {e}")))
    }

    async fn fetch_daily_series(
        &self,
        symbol: &str,
        days: u32,
    ) -> Result<Vec<DailyBar>, QuoteProviderError> {
        let api_key = self.key()?;

        // outputsize=compact covers the latest ~100 points, full goes back years
        let outputsize = if days <= 100 { "compact" } else { "full" };

        let resp = self
            .client
            .get(&self.base_url)
            .query(&[
                ("function", "TIME_SERIES_DAILY"),
                ("symbol", symbol),
                ("outputsize", outputsize),
                ("apikey", api_key),
            ])
            .send()
            .await
            .map_err(|e| QuoteProviderError::Network(e.to_string()))?;

        let body = resp
            .json::<AvDailyResponse>()
            .await
            .map_err(|e| QuoteProviderError::Parse(e.to_string()))?;

        if body.note.is_some() {
            return Err(QuoteProviderError::RateLimited);
        }
        if let Some(msg) = body.error_message {
            return Err(QuoteProviderError::BadResponse(msg));
        }

        let series = body
            .time_series
            .ok_or_else(|| QuoteProviderError::BadResponse("missing time series".into()))?;

        // Keyed by "YYYY-MM-DD"; BTreeMap iterates ascending, so bars come out
        // oldest first already.
        let mut out: Vec<DailyBar> = Vec::with_capacity(series.len());
        for (date_str, bar) in series {
            let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
                .map_err(|e| QuoteProviderError::Parse(e.to_string()))?;

            let close = BigDecimal::from_str(bar.close.trim())
                .map_err(|e| QuoteProviderError::Parse(e.to_string()))?;

            out.push(DailyBar {
                date,
                open: parse_decimal_or_zero(bar.open.as_deref()),
                high: parse_decimal_or_zero(bar.high.as_deref()),
                low: parse_decimal_or_zero(bar.low.as_deref()),
                close,
                volume: bar
                    .volume
                    .as_deref()
                    .and_then(|v| v.trim().parse::<i64>().ok())
                    .unwrap_or(0),
            });
        }

        // Trim to the requested window, keeping the most recent days.
        if (out.len() as u32) > days {
            let keep = days as usize;
            out = out.split_off(out.len() - keep);
        }

        Ok(out)
    }
}
