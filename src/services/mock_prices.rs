use std::sync::Arc;

use bigdecimal::{BigDecimal, ToPrimitive};
use chrono::{Duration as ChronoDuration, Utc};
use dashmap::DashMap;
use tracing::info;

use crate::external::quote_provider::DailyBar;

pub const SYNTHETIC_SOURCE: &str = "Synthetic (provider unavailable)";

/// Last-resort price source for when neither a live quote nor any cached one
/// exists. Baselines persist for the process lifetime, so repeated lookups of
/// an unknown symbol fluctuate around one generated value instead of jumping
/// randomly.
#[derive(Clone)]
pub struct MockPriceSource {
    baselines: Arc<DashMap<String, BigDecimal>>,
}

fn decimal_2dp(value: f64) -> BigDecimal {
    // exact cents, half-up via f64 rounding of a bounded value
    BigDecimal::from((value * 100.0).round() as i64) / BigDecimal::from(100)
}

impl MockPriceSource {
    pub fn new() -> Self {
        let baselines = DashMap::new();
        for (symbol, price) in [
            ("AAPL", "175.50"),
            ("GOOGL", "135.25"),
            ("MSFT", "420.75"),
            ("TSLA", "245.80"),
            ("AMZN", "155.90"),
            ("NVDA", "875.25"),
            ("SPY", "450.30"),
            ("QQQ", "385.60"),
            ("VTI", "245.75"),
            ("BTC", "45000.00"),
        ] {
            if let Ok(price) = price.parse::<BigDecimal>() {
                baselines.insert(symbol.to_string(), price);
            }
        }
        Self {
            baselines: Arc::new(baselines),
        }
    }

    /// Price for `symbol` (already uppercased by the gateway). Known symbols
    /// get one draw of ±2% noise around their baseline; unknown symbols are
    /// assigned a persistent baseline in [10, 500].
    pub fn price(&self, symbol: &str) -> BigDecimal {
        let baseline = self
            .baselines
            .entry(symbol.to_string())
            .or_insert_with(|| {
                let assigned = decimal_2dp(10.0 + rand::random::<f64>() * 490.0);
                info!("Generated new mock baseline for {}: {}", symbol, assigned);
                assigned
            })
            .clone();

        let base = baseline.to_f64().unwrap_or(100.0);
        let fluctuation = (rand::random::<f64>() - 0.5) * 0.04; // ±2%
        decimal_2dp(base * (1.0 + fluctuation))
    }

    /// Backward walk from today: the oldest bar sits near 80% of the current
    /// price and the newest approaches it, each day perturbed by ±2%. This is
    /// presentation filler, not market data; callers must label it as such.
    pub fn synthetic_history(&self, current_price: &BigDecimal, days: u32) -> Vec<DailyBar> {
        let current = current_price.to_f64().unwrap_or(100.0);
        let today = Utc::now().date_naive();
        let start = today - ChronoDuration::days(days as i64 - 1);

        let mut bars = Vec::with_capacity(days as usize);
        for i in 0..days {
            let date = start + ChronoDuration::days(i as i64);

            let variation = (rand::random::<f64>() - 0.5) * 0.04;
            let progress = f64::from(i) / f64::from(days);
            let base = current * (0.8 + 0.2 * progress);
            let day_price = base * (1.0 + variation);

            let open = day_price * (0.995 + rand::random::<f64>() * 0.01);
            let high = day_price * (1.005 + rand::random::<f64>() * 0.01);
            let low = day_price * (0.995 - rand::random::<f64>() * 0.01);
            let volume = (1_000_000.0 + rand::random::<f64>() * 5_000_000.0) as i64;

            bars.push(DailyBar {
                date,
                open: decimal_2dp(open),
                high: decimal_2dp(high),
                low: decimal_2dp(low),
                close: decimal_2dp(day_price),
                volume,
            });
        }
        bars
    }

    pub fn known_symbols(&self) -> usize {
        self.baselines.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_seeded_symbol_fluctuates_within_two_percent() {
        let mock = MockPriceSource::new();
        let baseline = BigDecimal::from_str("175.50").unwrap();

        for _ in 0..50 {
            let price = mock.price("AAPL");
            let ratio = (&price / &baseline).to_f64().unwrap();
            assert!((0.979..=1.021).contains(&ratio), "ratio {} out of band", ratio);
        }
    }

    #[test]
    fn test_unknown_symbol_assigned_in_range_and_persisted() {
        let mock = MockPriceSource::new();

        let first = mock.price("ZZZZ");
        let lower = BigDecimal::from(9);
        let upper = BigDecimal::from(511); // 500 baseline plus the ±2% draw
        assert!(first > lower && first < upper);

        // second draw fluctuates around the same persisted baseline
        let second = mock.price("ZZZZ");
        let ratio = (&second / &first).to_f64().unwrap();
        assert!((0.95..=1.05).contains(&ratio), "ratio {} drifted", ratio);
    }

    #[test]
    fn test_prices_have_two_decimal_places() {
        let mock = MockPriceSource::new();
        let price = mock.price("MSFT");
        assert!(price.as_bigint_and_exponent().1 <= 2);
    }

    #[test]
    fn test_synthetic_history_shape() {
        let mock = MockPriceSource::new();
        let current = BigDecimal::from(100);
        let bars = mock.synthetic_history(&current, 30);

        assert_eq!(bars.len(), 30);
        // chronological, ending today
        assert!(bars.windows(2).all(|w| w[0].date < w[1].date));
        assert_eq!(bars[29].date, Utc::now().date_naive());

        // oldest bar walks around 80% of current, newest near 100%
        let oldest = bars[0].close.to_f64().unwrap();
        let newest = bars[29].close.to_f64().unwrap();
        assert!((75.0..=85.0).contains(&oldest), "oldest {}", oldest);
        assert!((92.0..=103.0).contains(&newest), "newest {}", newest);

        for bar in &bars {
            assert!(bar.volume >= 1_000_000 && bar.volume <= 6_000_000);
        }
    }
}
