mod cli;
mod generate;

use clap::Parser;
use cli::{Cli, Command, ServeArgs};
use rf_core::capabilities::manager::missing_tools;
use rf_core::capabilities::CapabilitySet;
use rf_core::config::load_config;
use tracing::warn;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "reelforge=info,rf_core=info,rf_server=info,tower_http=info";

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn serve(args: ServeArgs) -> color_eyre::Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let missing = missing_tools(&config);
    if !missing.is_empty() {
        warn!(tools = ?missing, "Pipelines will fail until these tools are installed");
    }

    let capabilities = CapabilitySet::from_config(&config)?;
    rf_server::serve(config, capabilities).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    init_tracing();

    match Cli::parse().command {
        Command::Serve(args) => serve(args).await,
        Command::Generate(args) => generate::run(args).await,
    }
}
