//! Portico CLI entrypoint.

use clap::Parser;
use std::path::PathBuf;

mod commands;
mod config;
mod handlers;

#[cfg(test)]
mod handlers_tests;

use commands::{CacheCommands, Commands, ConfigCommands};
use portico_gateway::telemetry;

#[derive(Parser)]
#[command(name = "portico")]
#[command(author, version, about = "Portico citizen portal gateway", long_about = None)]
struct Cli {
    /// Configuration file (YAML or TOML)
    #[arg(short, long, global = true, env = "PORTICO_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut config = config::load(cli.config.as_deref())?;
    telemetry::init_tracing(&config.log)?;

    match cli.command {
        Commands::Serve { listen } => {
            if let Some(listen) = listen {
                config.listen = listen;
            }
            handlers::serve(config).await?
        }
        Commands::Cache { command } => match command {
            CacheCommands::List { partition } => handlers::list_cache(&config, partition).await?,
            CacheCommands::Clear { partition } => {
                handlers::clear_cache(&config, partition).await?;
            }
        },
        Commands::Config { command } => match command {
            ConfigCommands::Show => handlers::show_config(&config)?,
        },
        Commands::Check { path, token } => handlers::check(&config, &path, token.as_deref())?,
    }

    Ok(())
}
