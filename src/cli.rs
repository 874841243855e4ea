use std::net::SocketAddr;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::chart::ChartArgs;
use crate::constants::UPSTREAM_TIMEOUT_SECS;
use crate::gateway::GatewayConfig;
use crate::logging::Level;
use crate::quote::QuoteArgs;

#[derive(Debug, Parser)]
#[command(author, version, about = "HTTP gateway for B3 market data backed by Yahoo Finance")]
pub struct Cli {
    /// Minimum level of log lines written to stderr
    #[arg(long, global = true, value_enum, default_value_t = Level::Info)]
    pub log_level: Level,

    /// Upstream request timeout in seconds
    #[arg(
        long,
        global = true,
        default_value_t = UPSTREAM_TIMEOUT_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout_secs: u64,

    /// Override the Yahoo Finance query host (e.g. a local proxy)
    #[arg(long, global = true)]
    pub upstream_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    /// Defaults from `constants`, overridden by whatever was passed on the command line.
    pub fn config(&self) -> GatewayConfig {
        let mut config = GatewayConfig {
            upstream_timeout: Duration::from_secs(self.timeout_secs),
            ..GatewayConfig::default()
        };
        if let Some(url) = &self.upstream_url {
            config.endpoints.query_base = url.trim_end_matches('/').to_string();
        }
        if let Some(Command::Serve(ServeArgs { bind: Some(bind) })) = &self.command {
            config.bind_addr = *bind;
        }
        config
    }

    pub fn command(self) -> Command {
        self.command.unwrap_or_default()
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the HTTP API (default)
    Serve(ServeArgs),
    /// Look up a single ticker and print the JSON payload
    Quote(QuoteArgs),
    /// Plot the five-day close history as an ASCII chart
    Chart(ChartArgs),
}

impl Default for Command {
    fn default() -> Self {
        Command::Serve(ServeArgs::default())
    }
}

#[derive(Debug, Args, Clone, Default)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(short, long)]
    pub bind: Option<SocketAddr>,
}
