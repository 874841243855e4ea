use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{json, Value};

use crate::constants::{DEFAULT_CURRENCY, DEFAULT_LONG_NAME, DEFAULT_SECTOR};
use crate::error::{LookupError, ProviderError};
use crate::logging;
use crate::model::{round_price, AssetInfo, HealthStatus, Period, PriceHistory, Quote};
use crate::provider::{MarketDataProvider, Metadata, PricePoint};
use crate::ticker::Ticker;

/// Liveness payload. Never touches the upstream provider.
pub fn health() -> HealthStatus {
    HealthStatus::ok()
}

#[derive(Clone)]
pub struct QuoteService {
    provider: Arc<dyn MarketDataProvider>,
}

impl QuoteService {
    pub fn new(provider: Arc<dyn MarketDataProvider>) -> Self {
        Self { provider }
    }

    pub fn provider_id(&self) -> &'static str {
        self.provider.id()
    }

    /// Most recent close from a one-day window.
    pub async fn price(&self, raw: &str) -> Result<Quote, LookupError> {
        let ticker = Ticker::parse(raw)?;
        let window = self
            .provider
            .fetch_window(ticker.as_str(), Period::OneDay)
            .await
            .map_err(|err| self.upstream_failure("price", &ticker, err))?;

        let Some(last) = window.last() else {
            return Err(not_found(ticker, Period::OneDay));
        };

        let price = round_price(last.close).ok_or_else(|| {
            self.upstream_failure(
                "price",
                &ticker,
                ProviderError::Decode(format!("unusable close price {}", last.close)),
            )
        })?;

        Ok(Quote::new(ticker.into_string(), price))
    }

    /// Name, sector and currency, each falling back to a fixed default.
    pub async fn info(&self, raw: &str) -> Result<AssetInfo, LookupError> {
        let ticker = Ticker::parse(raw)?;
        let metadata = self
            .provider
            .fetch_metadata(ticker.as_str())
            .await
            .map_err(|err| self.upstream_failure("info", &ticker, err))?;

        Ok(AssetInfo {
            long_name: text_field(&metadata, "longName", DEFAULT_LONG_NAME),
            sector: text_field(&metadata, "sector", DEFAULT_SECTOR),
            currency: text_field(&metadata, "currency", DEFAULT_CURRENCY),
            ticker: ticker.into_string(),
        })
    }

    /// Five-day close history keyed by exchange-local date.
    pub async fn history(&self, raw: &str) -> Result<PriceHistory, LookupError> {
        let ticker = Ticker::parse(raw)?;
        let window = self
            .provider
            .fetch_window(ticker.as_str(), Period::FiveDays)
            .await
            .map_err(|err| self.upstream_failure("history", &ticker, err))?;

        if window.is_empty() {
            return Err(not_found(ticker, Period::FiveDays));
        }

        let history = closes_by_date(&window)
            .map_err(|err| self.upstream_failure("history", &ticker, err))?;

        Ok(PriceHistory {
            ticker: ticker.into_string(),
            period: Period::FiveDays,
            history,
        })
    }

    fn upstream_failure(&self, operation: &str, ticker: &Ticker, err: ProviderError) -> LookupError {
        logging::error(
            "lookup.upstream_error",
            "Upstream market data request failed",
            json!({
                "operation": operation,
                "ticker": ticker.as_str(),
                "provider": self.provider.id(),
                "error": err.to_string(),
            }),
        );
        LookupError::Upstream {
            ticker: ticker.to_string(),
            source: err,
        }
    }
}

fn not_found(ticker: Ticker, period: Period) -> LookupError {
    logging::info(
        "lookup.not_found",
        "No trading data in requested window",
        json!({ "ticker": ticker.as_str(), "period": period.as_str() }),
    );
    LookupError::NotFound {
        ticker: ticker.into_string(),
        period,
    }
}

/// Later observations on an already-seen date overwrite its value in place.
fn closes_by_date(window: &[PricePoint]) -> Result<IndexMap<String, f64>, ProviderError> {
    let mut history = IndexMap::with_capacity(window.len());
    for point in window {
        let price = round_price(point.close).ok_or_else(|| {
            ProviderError::Decode(format!("unusable close price {}", point.close))
        })?;
        history.insert(point.date().format("%Y-%m-%d").to_string(), price);
    }
    Ok(history)
}

fn text_field(metadata: &Metadata, key: &str, default: &str) -> String {
    match metadata.get(key) {
        Some(Value::String(value)) => value.clone(),
        _ => default.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::testkit::StaticProvider;

    fn service(provider: StaticProvider) -> QuoteService {
        QuoteService::new(Arc::new(provider))
    }

    #[tokio::test]
    async fn price_uses_last_close_rounded_half_up() {
        let provider = StaticProvider::new().with_closes(
            "PETR4.SA",
            Period::OneDay,
            &[("2024-03-04", 10.125), ("2024-03-04", 10.255)],
        );
        let quote = service(provider).price("petr4").await.expect("quote");
        assert_eq!(quote.ticker, "PETR4.SA");
        assert_eq!(quote.price, 10.26);
        assert_eq!(quote.source, "Yahoo Finance");
    }

    #[tokio::test]
    async fn price_midpoint_rounds_up_not_to_even() {
        let provider =
            StaticProvider::new().with_closes("VALE3.SA", Period::OneDay, &[("2024-03-04", 10.245)]);
        let quote = service(provider).price("VALE3.SA").await.expect("quote");
        assert_eq!(quote.price, 10.25);
    }

    #[tokio::test]
    async fn empty_window_is_not_found() {
        let err = service(StaticProvider::new())
            .price("xxxx1")
            .await
            .expect_err("no data");
        assert!(matches!(
            err,
            LookupError::NotFound { ref ticker, period: Period::OneDay } if ticker == "XXXX1.SA"
        ));
    }

    #[tokio::test]
    async fn provider_failure_is_upstream_error() {
        let err = service(StaticProvider::failing("socket closed by peer"))
            .price("petr4")
            .await
            .expect_err("upstream failure");
        assert!(matches!(err, LookupError::Upstream { .. }));
        assert!(!err.to_string().contains("socket closed by peer"));
    }

    #[tokio::test]
    async fn non_finite_close_is_upstream_error() {
        let provider =
            StaticProvider::new().with_closes("PETR4.SA", Period::OneDay, &[("2024-03-04", f64::NAN)]);
        let err = service(provider).price("petr4").await.expect_err("bad close");
        assert!(matches!(err, LookupError::Upstream { .. }));
    }

    #[tokio::test]
    async fn invalid_ticker_skips_upstream() {
        let provider = StaticProvider::new();
        let svc = service(provider.clone());
        let err = svc.price("   ").await.expect_err("empty ticker");
        assert!(matches!(err, LookupError::InvalidTicker(_)));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn info_defaults_missing_fields() {
        let provider = StaticProvider::new().with_metadata(
            "ITUB4.SA",
            json!({ "longName": "Itaú Unibanco Holding S.A.", "currency": null }),
        );
        let info = service(provider).info("itub4").await.expect("info");
        assert_eq!(info.ticker, "ITUB4.SA");
        assert_eq!(info.long_name, "Itaú Unibanco Holding S.A.");
        assert_eq!(info.sector, "N/A");
        assert_eq!(info.currency, "BRL");
    }

    #[tokio::test]
    async fn info_with_empty_metadata_uses_all_defaults() {
        let provider = StaticProvider::new().with_metadata("WEGE3.SA", json!({}));
        let info = service(provider).info("wege3").await.expect("info");
        assert_eq!(info.long_name, "Unknown");
        assert_eq!(info.sector, "N/A");
        assert_eq!(info.currency, "BRL");
    }

    #[tokio::test]
    async fn info_provider_rejection_is_upstream_error() {
        let err = service(StaticProvider::new())
            .info("zzzz9")
            .await
            .expect_err("unknown symbol");
        assert!(matches!(err, LookupError::Upstream { .. }));
    }

    #[tokio::test]
    async fn history_maps_dates_to_rounded_closes() {
        let provider = StaticProvider::new().with_closes(
            "BBAS3.SA",
            Period::FiveDays,
            &[
                ("2024-03-04", 27.114),
                ("2024-03-05", 27.505),
                ("2024-03-06", 28.0),
            ],
        );
        let history = service(provider).history("bbas3").await.expect("history");
        assert_eq!(history.period, Period::FiveDays);
        assert_eq!(history.history.len(), 3);
        let entries: Vec<(&str, f64)> = history
            .history
            .iter()
            .map(|(date, price)| (date.as_str(), *price))
            .collect();
        assert_eq!(
            entries,
            vec![("2024-03-04", 27.11), ("2024-03-05", 27.51), ("2024-03-06", 28.0)]
        );
    }

    #[tokio::test]
    async fn history_same_day_keeps_first_position_and_last_value() {
        let provider = StaticProvider::new().with_closes(
            "BBAS3.SA",
            Period::FiveDays,
            &[("2024-03-05", 1.0), ("2024-03-06", 2.0), ("2024-03-05", 3.0)],
        );
        let history = service(provider).history("bbas3").await.expect("history");
        let entries: Vec<(&String, &f64)> = history.history.iter().collect();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], (&"2024-03-05".to_string(), &3.0));
    }

    #[tokio::test]
    async fn empty_history_is_not_found() {
        let err = service(StaticProvider::new())
            .history("petr4")
            .await
            .expect_err("no history");
        assert!(matches!(
            err,
            LookupError::NotFound { period: Period::FiveDays, .. }
        ));
    }

    #[test]
    fn health_is_constant() {
        assert_eq!(health(), HealthStatus::ok());
    }
}
