mod models;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde_json::json;
use tokio::sync::RwLock;
use urlencoding::encode;

use crate::constants::{YAHOO_COOKIE_URL, YAHOO_QUERY_BASE_URL, YAHOO_USER_AGENT};
use crate::error::ProviderError;
use crate::logging;

use models::{chart_error, quote_summary_error, NOT_FOUND_CODE};

use super::{MarketDataProvider, Metadata, Period, PricePoint};

pub use models::{parse_chart, parse_quote_summary};

const SUMMARY_MODULES: &str = "price,summaryProfile";

/// Base URLs the provider talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YahooEndpoints {
    /// Host serving `/v8/finance/chart`, `/v10/finance/quoteSummary` and
    /// `/v1/test/getcrumb`.
    pub query_base: String,
    /// Page whose `Set-Cookie` header seeds the crumb handshake.
    pub cookie_url: String,
}

impl Default for YahooEndpoints {
    fn default() -> Self {
        Self {
            query_base: YAHOO_QUERY_BASE_URL.to_string(),
            cookie_url: YAHOO_COOKIE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct Crumb {
    cookie: String,
    value: String,
}

/// Price windows come from the public chart endpoint. Metadata comes from
/// quoteSummary, which needs the cookie/crumb pair Yahoo hands to browsers;
/// the pair is cached here and dropped when Yahoo answers 401.
pub struct YahooProvider {
    client: Client,
    endpoints: YahooEndpoints,
    crumb: RwLock<Option<Crumb>>,
}

impl YahooProvider {
    pub fn with_endpoints(endpoints: YahooEndpoints, timeout: Duration) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(YAHOO_USER_AGENT)
            .build()
            .map_err(ProviderError::Transport)?;

        Ok(Self {
            client,
            endpoints,
            crumb: RwLock::new(None),
        })
    }

    async fn ensure_crumb(&self) -> Result<Crumb, ProviderError> {
        if let Some(crumb) = self.crumb.read().await.as_ref() {
            return Ok(crumb.clone());
        }

        let crumb = self.fetch_crumb().await?;
        *self.crumb.write().await = Some(crumb.clone());
        Ok(crumb)
    }

    async fn fetch_crumb(&self) -> Result<Crumb, ProviderError> {
        // fc.yahoo.com answers 404 but still sets the session cookie.
        let response = self.client.get(&self.endpoints.cookie_url).send().await?;
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(';').next())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .ok_or_else(|| ProviderError::Auth("no session cookie returned".to_string()))?;

        let url = format!("{}/v1/test/getcrumb", self.endpoints.query_base);
        let response = self
            .client
            .get(&url)
            .header(header::COOKIE, &cookie)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Auth(format!(
                "crumb request returned HTTP {}",
                status.as_u16()
            )));
        }

        let value = response.text().await?.trim().to_string();
        if value.is_empty() {
            return Err(ProviderError::Auth("empty crumb".to_string()));
        }

        logging::debug(
            "yahoo.crumb.refreshed",
            "Fetched new Yahoo session crumb",
            json!({ "cookie_url": self.endpoints.cookie_url }),
        );

        Ok(Crumb { cookie, value })
    }

    async fn clear_crumb(&self) {
        *self.crumb.write().await = None;
    }
}

#[async_trait]
impl MarketDataProvider for YahooProvider {
    fn id(&self) -> &'static str {
        "YAHOO"
    }

    async fn fetch_window(
        &self,
        symbol: &str,
        period: Period,
    ) -> Result<Vec<PricePoint>, ProviderError> {
        let url = format!(
            "{}/v8/finance/chart/{}",
            self.endpoints.query_base,
            encode(symbol)
        );

        let response = self
            .client
            .get(&url)
            .query(&[("range", period.as_str()), ("interval", "1d")])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // Yahoo answers unknown symbols with 404 plus a `Not Found` chart error.
            return match chart_error(&body) {
                Some(error) if error.code == NOT_FOUND_CODE => Ok(Vec::new()),
                _ => Err(ProviderError::Status {
                    status: status.as_u16(),
                }),
            };
        }

        parse_chart(&body)
    }

    async fn fetch_metadata(&self, symbol: &str) -> Result<Metadata, ProviderError> {
        let crumb = self.ensure_crumb().await?;
        let url = format!(
            "{}/v10/finance/quoteSummary/{}",
            self.endpoints.query_base,
            encode(symbol)
        );

        let response = self
            .client
            .get(&url)
            .query(&[("modules", SUMMARY_MODULES), ("crumb", crumb.value.as_str())])
            .header(header::COOKIE, &crumb.cookie)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            self.clear_crumb().await;
            return Err(ProviderError::Auth("Yahoo session crumb expired".to_string()));
        }

        let body = response.text().await?;
        if !status.is_success() {
            return Err(match quote_summary_error(&body) {
                Some(error) => error.into(),
                None => ProviderError::Status {
                    status: status.as_u16(),
                },
            });
        }

        parse_quote_summary(&body)
    }
}
