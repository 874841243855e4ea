use anyhow::Result;
use clap::{Args, ValueEnum};
use serde::Serialize;

use crate::service::QuoteService;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LookupKind {
    /// Latest close price
    Price,
    /// Name, sector and currency
    Info,
    /// Five-day close history
    History,
}

#[derive(Debug, Args, Clone)]
pub struct QuoteArgs {
    /// What to look up
    #[arg(value_enum)]
    pub kind: LookupKind,

    /// Ticker symbol (e.g. PETR4 or PETR4.SA)
    pub ticker: String,

    /// Pretty-print the JSON payload
    #[arg(short, long)]
    pub pretty: bool,
}

/// Runs one lookup and prints the same JSON the HTTP route would return.
pub async fn run(service: &QuoteService, args: QuoteArgs) -> Result<()> {
    let rendered = match args.kind {
        LookupKind::Price => render(&service.price(&args.ticker).await?, args.pretty)?,
        LookupKind::Info => render(&service.info(&args.ticker).await?, args.pretty)?,
        LookupKind::History => render(&service.history(&args.ticker).await?, args.pretty)?,
    };
    println!("{rendered}");
    Ok(())
}

// Serialize the typed payload directly; a `serde_json::Value` detour would
// re-sort the history dates.
fn render<T: Serialize>(payload: &T, pretty: bool) -> Result<String> {
    let rendered = if pretty {
        serde_json::to_string_pretty(payload)?
    } else {
        serde_json::to_string(payload)?
    };
    Ok(rendered)
}
