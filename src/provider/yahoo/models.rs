use chrono::{FixedOffset, TimeZone};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::ProviderError;
use crate::model::PricePoint;
use crate::provider::Metadata;

/// Error code Yahoo uses for unknown or delisted symbols.
pub const NOT_FOUND_CODE: &str = "Not Found";

#[derive(Debug, Deserialize)]
pub struct YahooApiError {
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl From<YahooApiError> for ProviderError {
    fn from(err: YahooApiError) -> Self {
        ProviderError::Rejected {
            code: err.code,
            description: err.description.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChartResponse {
    pub chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
pub struct ChartEnvelope {
    #[serde(default)]
    pub result: Option<Vec<ChartResult>>,
    #[serde(default)]
    pub error: Option<YahooApiError>,
}

#[derive(Debug, Deserialize)]
pub struct ChartResult {
    #[serde(default)]
    pub meta: ChartMeta,
    #[serde(default)]
    pub timestamp: Vec<i64>,
    #[serde(default)]
    pub indicators: ChartIndicators,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChartMeta {
    /// Exchange offset from UTC, in seconds.
    #[serde(default)]
    pub gmtoffset: i32,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChartIndicators {
    #[serde(default)]
    pub quote: Vec<ChartQuote>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChartQuote {
    #[serde(default)]
    pub close: Vec<Option<f64>>,
}

/// Parses a chart payload into a close-price window.
///
/// A `Not Found` error or a result without timestamps is an empty window.
/// Rows with a `null` close are skipped.
pub fn parse_chart(body: &str) -> Result<Vec<PricePoint>, ProviderError> {
    let response: ChartResponse = serde_json::from_str(body)?;

    if let Some(error) = response.chart.error {
        if error.code == NOT_FOUND_CODE {
            return Ok(Vec::new());
        }
        return Err(error.into());
    }

    let Some(result) = response
        .chart
        .result
        .and_then(|results| results.into_iter().next())
    else {
        return Ok(Vec::new());
    };

    if result.timestamp.is_empty() {
        return Ok(Vec::new());
    }

    let offset = FixedOffset::east_opt(result.meta.gmtoffset).ok_or_else(|| {
        ProviderError::Decode(format!("invalid gmtoffset {}", result.meta.gmtoffset))
    })?;

    let closes = result
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|quote| quote.close)
        .unwrap_or_default();

    if closes.len() != result.timestamp.len() {
        return Err(ProviderError::Decode(format!(
            "chart has {} timestamps but {} closes",
            result.timestamp.len(),
            closes.len()
        )));
    }

    let mut points = Vec::with_capacity(closes.len());
    for (seconds, close) in result.timestamp.into_iter().zip(closes) {
        let Some(close) = close else {
            continue;
        };
        let timestamp = offset
            .timestamp_opt(seconds, 0)
            .single()
            .ok_or_else(|| ProviderError::Decode(format!("invalid timestamp {seconds}")))?;
        points.push(PricePoint { timestamp, close });
    }

    Ok(points)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSummaryResponse {
    pub quote_summary: QuoteSummaryEnvelope,
}

#[derive(Debug, Deserialize)]
pub struct QuoteSummaryEnvelope {
    #[serde(default)]
    pub result: Option<Vec<Map<String, Value>>>,
    #[serde(default)]
    pub error: Option<YahooApiError>,
}

/// Parses a quoteSummary payload into one flat field mapping.
///
/// Module objects (`price`, `summaryProfile`, ...) are merged; numeric
/// `{"raw": .., "fmt": ..}` wrappers collapse to their raw value.
pub fn parse_quote_summary(body: &str) -> Result<Metadata, ProviderError> {
    let response: QuoteSummaryResponse = serde_json::from_str(body)?;

    if let Some(error) = response.quote_summary.error {
        return Err(error.into());
    }

    let modules = response
        .quote_summary
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| ProviderError::Rejected {
            code: NOT_FOUND_CODE.to_string(),
            description: "quoteSummary returned no result".to_string(),
        })?;

    let mut fields = Metadata::new();
    for (_, module) in modules {
        if let Value::Object(module) = module {
            for (key, value) in module {
                fields.insert(key, unwrap_raw(value));
            }
        }
    }
    Ok(fields)
}

/// Yahoo's own error object in a chart payload, if the body carries one.
pub fn chart_error(body: &str) -> Option<YahooApiError> {
    serde_json::from_str::<ChartResponse>(body)
        .ok()
        .and_then(|response| response.chart.error)
}

/// Yahoo's own error object in a quoteSummary payload, if the body carries one.
pub fn quote_summary_error(body: &str) -> Option<YahooApiError> {
    serde_json::from_str::<QuoteSummaryResponse>(body)
        .ok()
        .and_then(|response| response.quote_summary.error)
}

fn unwrap_raw(value: Value) -> Value {
    match value {
        Value::Object(mut object) if object.contains_key("raw") => {
            object.remove("raw").unwrap_or(Value::Null)
        }
        other => other,
    }
}
