pub mod yahoo;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::ProviderError;
pub use crate::model::{Period, PricePoint};

pub use yahoo::{YahooEndpoints, YahooProvider};

/// Flat field mapping describing an instrument (`longName`, `sector`, ...).
pub type Metadata = Map<String, Value>;

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Short identifier used in logs.
    fn id(&self) -> &'static str;

    /// Close prices for the most recent `period`, oldest first, as returned by
    /// the provider. An unknown symbol yields an empty window, not an error.
    async fn fetch_window(
        &self,
        symbol: &str,
        period: Period,
    ) -> Result<Vec<PricePoint>, ProviderError>;

    async fn fetch_metadata(&self, symbol: &str) -> Result<Metadata, ProviderError>;
}

pub mod testkit {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use chrono::{FixedOffset, NaiveDate, TimeZone};

    use super::*;

    /// In-memory provider with canned windows and metadata.
    ///
    /// Unknown symbols get an empty window and a `Not Found` metadata
    /// rejection. A failing provider answers every call with an error whose
    /// description is the configured message.
    #[derive(Debug, Clone, Default)]
    pub struct StaticProvider {
        windows: HashMap<(String, Period), Vec<PricePoint>>,
        metadata: HashMap<String, Metadata>,
        failure: Option<String>,
        calls: Arc<AtomicUsize>,
    }

    impl StaticProvider {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing(message: impl Into<String>) -> Self {
            Self {
                failure: Some(message.into()),
                ..Self::default()
            }
        }

        pub fn with_window(
            mut self,
            symbol: &str,
            period: Period,
            points: Vec<PricePoint>,
        ) -> Self {
            self.windows.insert((symbol.to_string(), period), points);
            self
        }

        /// Closes given as `(YYYY-MM-DD, price)`, stamped at 10:00 Sao Paulo time.
        pub fn with_closes(self, symbol: &str, period: Period, closes: &[(&str, f64)]) -> Self {
            let points = closes
                .iter()
                .map(|(date, close)| PricePoint {
                    timestamp: sao_paulo_morning(date),
                    close: *close,
                })
                .collect();
            self.with_window(symbol, period, points)
        }

        pub fn with_metadata(mut self, symbol: &str, metadata: Value) -> Self {
            let fields = match metadata {
                Value::Object(map) => map,
                _ => Metadata::new(),
            };
            self.metadata.insert(symbol.to_string(), fields);
            self
        }

        /// Number of upstream calls served so far.
        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn record_call(&self) -> Result<(), ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.failure {
                Some(message) => Err(ProviderError::Rejected {
                    code: "Internal Server Error".to_string(),
                    description: message.clone(),
                }),
                None => Ok(()),
            }
        }
    }

    #[async_trait]
    impl MarketDataProvider for StaticProvider {
        fn id(&self) -> &'static str {
            "STATIC"
        }

        async fn fetch_window(
            &self,
            symbol: &str,
            period: Period,
        ) -> Result<Vec<PricePoint>, ProviderError> {
            self.record_call()?;
            Ok(self
                .windows
                .get(&(symbol.to_string(), period))
                .cloned()
                .unwrap_or_default())
        }

        async fn fetch_metadata(&self, symbol: &str) -> Result<Metadata, ProviderError> {
            self.record_call()?;
            self.metadata
                .get(symbol)
                .cloned()
                .ok_or_else(|| ProviderError::Rejected {
                    code: "Not Found".to_string(),
                    description: format!("Quote not found for symbol: {symbol}"),
                })
        }
    }

    fn sao_paulo_morning(date: &str) -> chrono::DateTime<FixedOffset> {
        let offset = FixedOffset::west_opt(3 * 3600).expect("static offset is in range");
        let naive = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .expect("testkit dates use YYYY-MM-DD")
            .and_hms_opt(10, 0, 0)
            .expect("10:00 is a valid time");
        offset
            .from_local_datetime(&naive)
            .single()
            .expect("fixed offsets are unambiguous")
    }
}
