use anyhow::Context;
use gamewatch::adapters::{DiscordNotifier, LogChat, RiotClient, SteamClient};
use gamewatch::config::AppConfig;
use gamewatch::domain::{Category, Ecosystem, MatchGame, TrackedEntity};
use gamewatch::error::{GameWatchError, ResolutionFailure, Result};
use gamewatch::ports::{ChatPlatform, MatchApi, StorefrontApi};
use gamewatch::services::{
    resolve_storefront_id, ControlServer, EntityResolver, MatchPipeline, PollScheduler,
    PurchasePipeline,
};
use gamewatch::tracker::{MatchNovelty, PurchaseNovelty};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::main_runtime::shutdown_signal;

/// Upstream clients, built only for the ecosystems that have something to track
struct Upstreams {
    riot: Option<Arc<RiotClient>>,
    steam: Option<Arc<SteamClient>>,
}

impl Upstreams {
    fn from_config(config: &AppConfig) -> Result<Self> {
        let timeout = config.request_timeout();

        let riot = if config.tracking.players.is_empty() {
            None
        } else {
            Some(Arc::new(RiotClient::new(
                &config.riot.api_key,
                &config.riot.region,
                timeout,
            )?))
        };

        let steam = match (&config.steam.api_key, config.steam.account_ids.is_empty()) {
            (Some(key), false) => Some(Arc::new(SteamClient::new(key, timeout)?)),
            _ => None,
        };

        Ok(Self { riot, steam })
    }
}

/// Tracked entities after startup resolution
struct Roster {
    players: Vec<TrackedEntity>,
    steam_accounts: Vec<TrackedEntity>,
}

async fn resolve_roster(config: &AppConfig, upstreams: &Upstreams) -> Roster {
    let players = match &upstreams.riot {
        Some(riot) => {
            EntityResolver::new(riot.clone())
                .resolve_all(&config.tracking.players, Ecosystem::MatchGame)
                .await
        }
        None => Vec::new(),
    };

    let mut steam_accounts: Vec<TrackedEntity> = Vec::new();
    for id in &config.steam.account_ids {
        match resolve_storefront_id(id) {
            Ok(entity) if steam_accounts.contains(&entity) => {
                warn!("Steam account {} listed twice, skipping", id)
            }
            Ok(entity) => steam_accounts.push(entity),
            Err(e) => warn!("Not tracking {}: {}", e.display_name(), e),
        }
    }

    info!(
        "Resolved {}/{} players and {}/{} Steam accounts",
        players.len(),
        config.tracking.players.len(),
        steam_accounts.len(),
        config.steam.account_ids.len()
    );

    Roster {
        players,
        steam_accounts,
    }
}

fn build_chat(config: &AppConfig, dry_run: bool) -> Result<Arc<dyn ChatPlatform>> {
    if dry_run {
        info!("Dry run: notifications are logged, not posted");
        return Ok(Arc::new(LogChat::new()));
    }
    Ok(Arc::new(DiscordNotifier::new(
        &config.discord.bot_token,
        config.request_timeout(),
    )?))
}

/// One scheduler with a pipeline per category that has entities to poll
fn build_scheduler(
    config: &AppConfig,
    upstreams: &Upstreams,
    roster: Roster,
    chat: Arc<dyn ChatPlatform>,
) -> PollScheduler {
    let mut scheduler =
        PollScheduler::new(Duration::from_secs(config.polling.ready_retry_secs.max(1)));
    let policy = config.tracking.first_sight;

    if let Some(riot) = &upstreams.riot {
        if !roster.players.is_empty() {
            for game in MatchGame::ALL {
                let category = Category::Match(game);
                let api: Arc<dyn MatchApi> = riot.clone();
                let pipeline = MatchPipeline::new(
                    game,
                    roster.players.clone(),
                    api,
                    MatchNovelty::new(policy),
                    Arc::clone(&chat),
                    config.destination(category),
                );
                scheduler =
                    scheduler.with_category(Arc::new(pipeline), config.polling.cadence(category));
            }
        }
    }

    if let Some(steam) = &upstreams.steam {
        if !roster.steam_accounts.is_empty() {
            let api: Arc<dyn StorefrontApi> = steam.clone();
            let novelty = PurchaseNovelty::new(policy, config.tracking.purchase_memory_cap)
                .with_recency_threshold(config.tracking.purchase_recency_minutes);
            let pipeline = PurchasePipeline::new(
                roster.steam_accounts,
                api,
                novelty,
                Arc::clone(&chat),
                config.destination(Category::Storefront),
            );
            scheduler = scheduler.with_category(
                Arc::new(pipeline),
                config.polling.cadence(Category::Storefront),
            );
        }
    }

    scheduler
}

fn validate(config: &AppConfig, dry_run: bool) -> Result<()> {
    config.validate(dry_run).map_err(|errors| {
        for problem in &errors {
            error!("Config: {}", problem);
        }
        GameWatchError::Validation(errors.join("; "))
    })
}

/// Long-running service: pollers plus the control server
pub async fn run_service(config: AppConfig, dry_run: bool) -> Result<()> {
    validate(&config, dry_run)?;

    let upstreams = Upstreams::from_config(&config)?;
    let chat = build_chat(&config, dry_run)?;
    let roster = resolve_roster(&config, &upstreams).await;
    let scheduler = Arc::new(build_scheduler(&config, &upstreams, roster, Arc::clone(&chat)));

    if scheduler.categories().is_empty() {
        warn!("No category has anything to poll; only the control server will run");
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let control = if config.control.enabled {
        let server = ControlServer::new(Arc::clone(&scheduler), config.control.port);
        let rx = shutdown_rx.clone();
        Some(tokio::spawn(async move {
            if let Err(e) = server.run(rx).await {
                error!("Control server failed: {}", e);
            }
        }))
    } else {
        None
    };

    let poller = tokio::spawn(Arc::clone(&scheduler).run(chat, shutdown_rx));

    shutdown_signal().await;
    info!("Shutdown requested, finishing in-flight ticks");
    let _ = shutdown_tx.send(true);

    if let Err(e) = poller.await {
        error!("Scheduler task failed: {}", e);
    }
    if let Some(control) = control {
        if let Err(e) = control.await {
            error!("Control server task failed: {}", e);
        }
    }

    info!("Shutdown complete");
    Ok(())
}

/// Resolve, wait for chat readiness, then run one manual pass
pub async fn run_check(config: AppConfig, game: Option<Category>, dry_run: bool) -> Result<()> {
    validate(&config, dry_run)?;

    let upstreams = Upstreams::from_config(&config)?;
    let chat = build_chat(&config, dry_run)?;
    let roster = resolve_roster(&config, &upstreams).await;
    let scheduler = build_scheduler(&config, &upstreams, roster, Arc::clone(&chat));

    let (_shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let ready = tokio::select! {
        ready = scheduler.wait_until_ready(chat.as_ref(), &mut shutdown_rx) => ready,
        _ = shutdown_signal() => false,
    };
    if !ready {
        return Err(GameWatchError::NotReady);
    }

    let reports = scheduler.trigger(game).await?;
    if reports.is_empty() {
        println!("Nothing to check");
    }
    for report in &reports {
        println!(
            "{:<6} entities={} new={} sent={} fetch_failures={} send_failures={} ({}ms)",
            report.category,
            report.entities,
            report.admitted,
            report.sent,
            report.fetch_failures,
            report.send_failures,
            report.elapsed_ms
        );
    }
    Ok(())
}

/// Print how every configured player and account resolves.
///
/// Fails with the first resolution error when any entry did not resolve.
pub async fn run_resolve(config: AppConfig) -> anyhow::Result<()> {
    let upstreams =
        Upstreams::from_config(&config).context("failed to build upstream clients")?;
    let total = config.tracking.players.len() + config.steam.account_ids.len();
    let mut failures: Vec<ResolutionFailure> = Vec::new();

    match &upstreams.riot {
        Some(riot) => {
            let resolver = EntityResolver::new(riot.clone());
            for name in &config.tracking.players {
                match resolver.resolve(name, Ecosystem::MatchGame).await {
                    Ok(entity) => println!("✓ {:<28} {}", entity.display_name, entity.stable_id),
                    Err(e) => {
                        println!("✗ {:<28} {}", e.display_name(), e);
                        failures.push(e);
                    }
                }
            }
        }
        None => println!("No Riot players configured"),
    }

    for id in &config.steam.account_ids {
        match resolve_storefront_id(id) {
            Ok(entity) => println!("✓ {:<28} {}", id, entity.ecosystem),
            Err(e) => {
                println!("✗ {:<28} {}", id, e);
                failures.push(e);
            }
        }
    }

    let unresolved = failures.len();
    match failures.into_iter().next() {
        Some(first) => Err(GameWatchError::Resolution(first))
            .with_context(|| format!("{} of {} entries did not resolve", unresolved, total)),
        None => Ok(()),
    }
}
