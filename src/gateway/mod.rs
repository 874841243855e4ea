mod routes;

use std::future::Future;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::signal::unix::{signal, SignalKind};

use crate::constants::{GATEWAY_PORT, UPSTREAM_TIMEOUT_SECS};
use crate::logging;
use crate::provider::{YahooEndpoints, YahooProvider};
use crate::service::QuoteService;

pub use routes::router;

#[derive(Clone, Debug)]
pub struct GatewayConfig {
    pub bind_addr: SocketAddr,
    pub upstream_timeout: Duration,
    pub endpoints: YahooEndpoints,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), GATEWAY_PORT),
            upstream_timeout: Duration::from_secs(UPSTREAM_TIMEOUT_SECS),
            endpoints: YahooEndpoints::default(),
        }
    }
}

impl GatewayConfig {
    /// Builds the Yahoo-backed lookup service this config describes.
    pub fn build_service(&self) -> Result<QuoteService> {
        let provider = YahooProvider::with_endpoints(self.endpoints.clone(), self.upstream_timeout)
            .context("failed to build upstream HTTP client")?;
        Ok(QuoteService::new(Arc::new(provider)))
    }
}

/// Serves until SIGINT or SIGTERM.
pub async fn run_with_config(config: GatewayConfig) -> Result<()> {
    let service = config.build_service()?;
    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind gateway at {}", config.bind_addr))?;

    logging::info(
        "gateway.config",
        "Gateway configured",
        json!({
            "upstream": config.endpoints.query_base,
            "upstream_timeout_ms": config.upstream_timeout.as_millis() as u64,
        }),
    );

    serve_with_shutdown(listener, service, shutdown_signal()).await
}

/// Serves `service` on an already-bound listener until `shutdown` resolves,
/// then drains in-flight requests.
pub async fn serve_with_shutdown<F>(
    listener: TcpListener,
    service: QuoteService,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener
        .local_addr()
        .context("failed to read gateway listener address")?;

    logging::info(
        "gateway.bind",
        "Gateway listening for HTTP requests",
        json!({ "addr": addr.to_string(), "provider": service.provider_id() }),
    );

    axum::serve(listener, router(service).into_make_service())
        .with_graceful_shutdown(shutdown)
        .await
        .context("gateway server terminated with error")?;

    logging::info_simple("gateway.stop", "Gateway HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match wait_for_signal().await {
        Ok(name) => logging::info(
            "signal.received",
            "Signal received, shutting down gracefully",
            json!({ "signal": name }),
        ),
        Err(err) => {
            logging::warn(
                "signal.unavailable",
                "Signal handlers unavailable; serving until killed",
                json!({ "error": format!("{err:?}") }),
            );
            std::future::pending::<()>().await;
        }
    }
}

async fn wait_for_signal() -> Result<&'static str> {
    let mut sigterm =
        signal(SignalKind::terminate()).context("failed to register SIGTERM handler")?;
    let mut sigint =
        signal(SignalKind::interrupt()).context("failed to register SIGINT handler")?;

    tokio::select! {
        _ = sigterm.recv() => Ok("SIGTERM"),
        _ = sigint.recv() => Ok("SIGINT"),
    }
}
