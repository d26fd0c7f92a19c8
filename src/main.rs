mod main_modes;
mod main_runtime;

use clap::Parser;
use gamewatch::cli::{Cli, Commands};
use gamewatch::config::AppConfig;
use gamewatch::error::Result;

use main_runtime::{init_logging, init_logging_simple};

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional; real environment variables win
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = AppConfig::load_from(&cli.config_dir)?;

    match cli.command() {
        Commands::Run { dry_run } => {
            let _log_guard = init_logging(&config.logging);
            main_modes::run_service(config, dry_run).await?;
        }
        Commands::Check { game, dry_run } => {
            let _log_guard = init_logging(&config.logging);
            main_modes::run_check(config, game, dry_run).await?;
        }
        Commands::Resolve => {
            init_logging_simple();
            main_modes::run_resolve(config).await?;
        }
    }

    Ok(())
}
