use config::{Config, ConfigError, Environment, File, Map};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::adapters::riot::{DEFAULT_RIOT_REGION, RIOT_REGIONS};
use crate::domain::{Category, MatchGame};
use crate::tracker::{FirstSightPolicy, DEFAULT_PURCHASE_RECENCY_MINUTES};

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub riot: RiotConfig,
    #[serde(default)]
    pub steam: SteamConfig,
    #[serde(default)]
    pub discord: DiscordConfig,
    pub tracking: TrackingConfig,
    pub polling: PollingConfig,
    pub control: ControlConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RiotConfig {
    #[serde(default)]
    pub api_key: String,
    /// Regional routing host for account and match APIs (americas, asia, europe, sea)
    pub region: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SteamConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    /// SteamID64s to watch for purchases
    #[serde(default)]
    pub account_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiscordConfig {
    #[serde(default)]
    pub bot_token: String,
    #[serde(default)]
    pub league_channel_id: Option<u64>,
    #[serde(default)]
    pub valorant_channel_id: Option<u64>,
    /// Falls back to the League channel when unset
    #[serde(default)]
    pub steam_channel_id: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackingConfig {
    /// Riot ids ("GameName#Tag" or "GameName/Tag")
    #[serde(default)]
    pub players: Vec<String>,
    #[serde(default)]
    pub first_sight: FirstSightPolicy,
    pub purchase_memory_cap: usize,
    pub purchase_recency_minutes: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    pub match_interval_secs: u64,
    pub purchase_interval_secs: u64,
    /// Delay between chat readiness probes at startup
    pub ready_retry_secs: u64,
}

impl PollingConfig {
    pub fn cadence(&self, category: Category) -> Duration {
        match category {
            Category::Match(_) => Duration::from_secs(self.match_interval_secs),
            Category::Storefront => Duration::from_secs(self.purchase_interval_secs),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ControlConfig {
    pub enabled: bool,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Flat variables accepted for compatibility with older deployments
const LEGACY_VARS: [(&str, &str); 7] = [
    ("RIOT_API_KEY", "riot.api_key"),
    ("RIOT_REGION", "riot.region"),
    ("DISCORD_BOT_TOKEN", "discord.bot_token"),
    ("LOL_CHANNEL_ID", "discord.league_channel_id"),
    ("VAL_CHANNEL_ID", "discord.valorant_channel_id"),
    ("STEAM_CHANNEL_ID", "discord.steam_channel_id"),
    ("STEAM_API_KEY", "steam.api_key"),
];

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl AppConfig {
    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let env: Map<String, String> = std::env::vars().collect();
        Self::load_with_env(config_dir, &env)
    }

    /// Load configuration against an explicit environment snapshot
    pub fn load_with_env<P: AsRef<Path>>(
        config_dir: P,
        env: &Map<String, String>,
    ) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();
        let profile = env
            .get("GAMEWATCH_ENV")
            .cloned()
            .unwrap_or_else(|| "development".to_string());

        let mut builder = Config::builder()
            // Start with default values
            .set_default("riot.region", DEFAULT_RIOT_REGION)?
            .set_default("riot.timeout_secs", 30)?
            .set_default("tracking.first_sight", FirstSightPolicy::default().as_str())?
            .set_default("tracking.purchase_memory_cap", 20)?
            .set_default(
                "tracking.purchase_recency_minutes",
                DEFAULT_PURCHASE_RECENCY_MINUTES,
            )?
            .set_default("polling.match_interval_secs", 30)?
            .set_default("polling.purchase_interval_secs", 300)?
            .set_default("polling.ready_retry_secs", 5)?
            .set_default("control.enabled", true)?
            .set_default("control.port", 8080)?
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(File::from(config_dir.join(profile)).required(false))
            // Override with environment variables (GAMEWATCH__RIOT__REGION, etc.)
            .add_source(
                Environment::with_prefix("GAMEWATCH")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("tracking.players")
                    .with_list_parse_key("steam.account_ids")
                    .try_parsing(true)
                    .source(Some(env.clone())),
            );

        // Legacy flat variables win over everything else
        for (var, key) in LEGACY_VARS {
            let value = env
                .get(var)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty());
            builder = builder.set_override_option(key, value)?;
        }
        builder = builder
            .set_override_option("tracking.players", env.get("ALL_GAMERS").map(|v| split_list(v)))?
            .set_override_option("steam.account_ids", env.get("STEAM_IDS").map(|v| split_list(v)))?;

        builder.build()?.try_deserialize()
    }

    /// Destination channel for a category
    pub fn destination(&self, category: Category) -> Option<u64> {
        match category {
            Category::Match(MatchGame::League) => self.discord.league_channel_id,
            Category::Match(MatchGame::Valorant) => self.discord.valorant_channel_id,
            Category::Storefront => self
                .discord
                .steam_channel_id
                .or(self.discord.league_channel_id),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.riot.timeout_secs)
    }

    /// Validate configuration values, reporting every problem at once
    pub fn validate(&self, dry_run: bool) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.tracking.players.is_empty() && self.steam.account_ids.is_empty() {
            errors.push("nothing to track: set tracking.players (ALL_GAMERS) or steam.account_ids (STEAM_IDS)".to_string());
        }

        if !self.tracking.players.is_empty() && self.riot.api_key.trim().is_empty() {
            errors.push("riot.api_key (RIOT_API_KEY) is required to track players".to_string());
        }

        if !RIOT_REGIONS.contains(&self.riot.region.as_str()) {
            errors.push(format!(
                "riot.region must be one of {:?}, got '{}'",
                RIOT_REGIONS, self.riot.region
            ));
        }

        if !self.steam.account_ids.is_empty() {
            if self.steam.api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
                errors.push("steam.api_key (STEAM_API_KEY) is required to track Steam accounts".to_string());
            }
            for id in &self.steam.account_ids {
                if id.parse::<u64>().is_err() {
                    errors.push(format!("Steam account id '{}' is not a SteamID64", id));
                }
            }
        }

        if !dry_run && self.discord.bot_token.trim().is_empty() {
            errors.push("discord.bot_token (DISCORD_BOT_TOKEN) is required".to_string());
        }

        if self.polling.match_interval_secs == 0 || self.polling.purchase_interval_secs == 0 {
            errors.push("polling intervals must be positive".to_string());
        }

        if self.tracking.purchase_memory_cap == 0 {
            errors.push("tracking.purchase_memory_cap must be positive".to_string());
        }

        if self.riot.timeout_secs == 0 {
            errors.push("riot.timeout_secs must be positive".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
