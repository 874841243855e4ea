use anyhow::Result;
use clap::Parser;
use market_data_api::chart;
use market_data_api::cli::{Cli, Command};
use market_data_api::gateway;
use market_data_api::logging;
use market_data_api::quote;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::set_level(cli.log_level);
    let config = cli.config();

    match cli.command() {
        Command::Serve(_) => gateway::run_with_config(config).await,
        Command::Quote(args) => quote::run(&config.build_service()?, args).await,
        Command::Chart(args) => chart::run(&config.build_service()?, args).await,
    }
}
