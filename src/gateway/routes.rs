use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde_json::json;

use crate::error::LookupError;
use crate::logging;
use crate::model::{AssetInfo, HealthStatus, PriceHistory, Quote};
use crate::service::{self, QuoteService};

/// Route table: `/health`, `/price/:ticker`, `/info/:ticker`, `/history/:ticker`.
pub fn router(service: QuoteService) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/price/:ticker", get(price))
        .route("/info/:ticker", get(info))
        .route("/history/:ticker", get(history))
        .with_state(service)
}

async fn health() -> Json<HealthStatus> {
    Json(service::health())
}

async fn price(
    State(service): State<QuoteService>,
    Path(ticker): Path<String>,
) -> Result<Json<Quote>, LookupError> {
    log_request("price", &ticker);
    service.price(&ticker).await.map(Json)
}

async fn info(
    State(service): State<QuoteService>,
    Path(ticker): Path<String>,
) -> Result<Json<AssetInfo>, LookupError> {
    log_request("info", &ticker);
    service.info(&ticker).await.map(Json)
}

async fn history(
    State(service): State<QuoteService>,
    Path(ticker): Path<String>,
) -> Result<Json<PriceHistory>, LookupError> {
    log_request("history", &ticker);
    service.history(&ticker).await.map(Json)
}

fn log_request(route: &str, ticker: &str) {
    logging::debug(
        "gateway.request",
        "Lookup requested",
        json!({ "route": route, "ticker": ticker }),
    );
}
