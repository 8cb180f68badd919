mod cli;
mod output;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use linkdeck::config::Config;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "linkdeck=warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::discover(cli.config.as_deref()).await?;

    match cli.command {
        Commands::Check { catalog } => {
            let path = catalog.unwrap_or(config.catalog);
            output::check(&path).await?;
        }
        Commands::Search {
            query,
            catalog,
            json,
        } => {
            let path = catalog.unwrap_or_else(|| config.catalog.clone());
            output::search(&path, &query, json).await?;
        }
        Commands::Outline {
            catalog,
            query,
            active,
        } => {
            let path = catalog.unwrap_or_else(|| config.catalog.clone());
            output::outline(&path, &config, query.as_deref(), active.as_deref()).await?;
        }
        Commands::Replay {
            script,
            catalog,
            json,
        } => {
            let path = catalog.unwrap_or_else(|| config.catalog.clone());
            output::replay(&path, &config, &script, json).await?;
        }
        Commands::Import { input, output } => {
            output::import(&input, &output).await?;
        }
    }

    Ok(())
}
