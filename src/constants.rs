pub const SERVICE_NAME: &str = "market-data-api";
pub const QUOTE_SOURCE: &str = "Yahoo Finance";
pub const EXCHANGE_SUFFIX: &str = ".SA";
pub const GATEWAY_PORT: u16 = 8000;
pub const UPSTREAM_TIMEOUT_SECS: u64 = 10;
pub const YAHOO_QUERY_BASE_URL: &str = "https://query1.finance.yahoo.com";
pub const YAHOO_COOKIE_URL: &str = "https://fc.yahoo.com";
pub const YAHOO_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

pub const DEFAULT_LONG_NAME: &str = "Unknown";
pub const DEFAULT_SECTOR: &str = "N/A";
pub const DEFAULT_CURRENCY: &str = "BRL";
