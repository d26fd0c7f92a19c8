use clap::{Parser, Subcommand};

use crate::domain::Category;

#[derive(Parser, Debug)]
#[command(name = "gamewatch")]
#[command(version)]
#[command(about = "Posts new Riot matches and Steam purchases of tracked players to Discord", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Directory holding default.toml and per-environment overrides
    #[arg(short, long, default_value = "config", global = true)]
    pub config_dir: String,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the pollers and the control server until stopped
    Run {
        /// Log notifications instead of posting them
        #[arg(long)]
        dry_run: bool,
    },
    /// Resolve players, then run one manual check and exit
    Check {
        /// Only check one category (lol, val, steam)
        #[arg(short, long)]
        game: Option<Category>,
        /// Log notifications instead of posting them
        #[arg(long)]
        dry_run: bool,
    },
    /// Resolve the configured players and print their ids
    Resolve,
}

impl Cli {
    /// `run` is the default when no subcommand is given
    pub fn command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or(Commands::Run { dry_run: false })
    }
}
