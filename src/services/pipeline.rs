//! One category's fetch -> filter -> format -> send pass over every tracked entity.
//!
//! Each pipeline owns its novelty state behind a tokio mutex that is held for
//! the whole tick, so a scheduled tick and a manual trigger for the same
//! category never interleave.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use super::fetcher::{LatestMatch, MatchFetcher, TitleFetcher};
use crate::domain::{
    Category, ChannelHandle, FetchedItem, MatchGame, TickPhase, TrackedEntity,
};
use crate::error::{FetchFailure, GameWatchError, Result};
use crate::ports::{ChatPlatform, MatchApi, StorefrontApi};
use crate::tracker::{format_notification, MatchNovelty, PurchaseNovelty, Verdict};

/// What started a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TickTrigger {
    Scheduled,
    Manual,
}

/// Outcome counters for one tick of one category
#[derive(Debug, Clone, Serialize)]
pub struct TickReport {
    pub category: Category,
    pub trigger: TickTrigger,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub entities: usize,
    pub fetched: usize,
    pub unchanged: usize,
    pub admitted: usize,
    pub baselined: usize,
    pub sent: usize,
    pub fetch_failures: usize,
    pub render_failures: usize,
    pub send_failures: usize,
    pub destination_missing: bool,
}

impl TickReport {
    fn start(category: Category, trigger: TickTrigger, entities: usize) -> Self {
        Self {
            category,
            trigger,
            started_at: Utc::now(),
            elapsed_ms: 0,
            entities,
            fetched: 0,
            unchanged: 0,
            admitted: 0,
            baselined: 0,
            sent: 0,
            fetch_failures: 0,
            render_failures: 0,
            send_failures: 0,
            destination_missing: false,
        }
    }

    fn finish(mut self) -> Self {
        self.elapsed_ms = (Utc::now() - self.started_at).num_milliseconds().max(0) as u64;
        self
    }
}

/// A category that can be ticked by the scheduler or a manual trigger
#[async_trait]
pub trait PollCategory: Send + Sync {
    fn category(&self) -> Category;

    fn phase(&self) -> TickPhase;

    /// Process every tracked entity once; returns after all sends were attempted
    async fn run_tick(&self, trigger: TickTrigger) -> TickReport;
}

/// Observable tick phase of a pipeline
struct PhaseCell {
    category: Category,
    tx: watch::Sender<TickPhase>,
}

impl PhaseCell {
    fn new(category: Category) -> Self {
        let (tx, _rx) = watch::channel(TickPhase::Idle);
        Self { category, tx }
    }

    fn get(&self) -> TickPhase {
        *self.tx.borrow()
    }

    fn set(&self, next: TickPhase) {
        let current = self.get();
        if !current.can_transition_to(next) {
            warn!(
                "{} tick phase jumped {} -> {}",
                self.category, current, next
            );
        }
        self.tx.send_replace(next);
    }
}

/// Shared sending half of both pipelines
struct Outbox {
    category: Category,
    chat: Arc<dyn ChatPlatform>,
    channel_id: Option<u64>,
}

impl Outbox {
    /// Resolve the category's channel for this tick; `None` skips every send
    async fn destination(&self) -> Option<ChannelHandle> {
        match self.lookup_destination().await {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!("{}, sends skipped this tick", e);
                None
            }
        }
    }

    async fn lookup_destination(&self) -> Result<ChannelHandle> {
        let channel_id = self.channel_id.ok_or_else(|| {
            GameWatchError::DestinationUnavailable(format!(
                "no channel configured for {}",
                self.category
            ))
        })?;
        self.chat
            .resolve_destination(channel_id)
            .await
            .ok_or_else(|| {
                GameWatchError::DestinationUnavailable(format!(
                    "channel {} for {} not found",
                    channel_id, self.category
                ))
            })
    }

    async fn deliver(
        &self,
        entity: &TrackedEntity,
        item: &FetchedItem,
        destination: Option<&ChannelHandle>,
        report: &mut TickReport,
    ) {
        let payload = match format_notification(entity, item, self.category, Utc::now()) {
            Ok(payload) => payload,
            Err(e) => {
                report.render_failures += 1;
                warn!(
                    "Skipping {} notification for {} ({}): {}",
                    self.category, entity.display_name, item.id, e
                );
                return;
            }
        };

        let Some(destination) = destination else {
            return;
        };

        match self.chat.send(destination, &payload).await {
            Ok(()) => {
                report.sent += 1;
                info!(
                    "Notified {} {} for {} ({})",
                    self.category, item.id, entity.display_name, payload.title
                );
            }
            Err(e) => {
                report.send_failures += 1;
                warn!(
                    "Failed to send {} notification for {}: {}",
                    self.category, entity.display_name, e
                );
            }
        }
    }
}

fn log_fetch_failure(category: Category, entity: &TrackedEntity, err: &FetchFailure) {
    if err.is_transient() {
        debug!("{} fetch for {} failed: {}", category, entity.display_name, err);
    } else {
        warn!("{} fetch for {} failed: {}", category, entity.display_name, err);
    }
}

/// Latest-match polling for one match game
pub struct MatchPipeline {
    game: MatchGame,
    entities: Vec<TrackedEntity>,
    fetcher: MatchFetcher,
    novelty: Mutex<MatchNovelty>,
    outbox: Outbox,
    phase: PhaseCell,
}

impl MatchPipeline {
    pub fn new(
        game: MatchGame,
        entities: Vec<TrackedEntity>,
        api: Arc<dyn MatchApi>,
        novelty: MatchNovelty,
        chat: Arc<dyn ChatPlatform>,
        channel_id: Option<u64>,
    ) -> Self {
        let category = Category::Match(game);
        Self {
            game,
            entities,
            fetcher: MatchFetcher::new(api),
            novelty: Mutex::new(novelty),
            outbox: Outbox {
                category,
                chat,
                channel_id,
            },
            phase: PhaseCell::new(category),
        }
    }

    /// Current watermark for a player (inspection and tests)
    pub async fn watermark(&self, stable_id: &str) -> Option<String> {
        self.novelty
            .lock()
            .await
            .known(stable_id, self.game)
            .map(str::to_string)
    }
}

#[async_trait]
impl PollCategory for MatchPipeline {
    fn category(&self) -> Category {
        Category::Match(self.game)
    }

    fn phase(&self) -> TickPhase {
        self.phase.get()
    }

    async fn run_tick(&self, trigger: TickTrigger) -> TickReport {
        let mut novelty = self.novelty.lock().await;
        let category = self.category();
        let mut report = TickReport::start(category, trigger, self.entities.len());

        let destination = self.outbox.destination().await;
        report.destination_missing = destination.is_none();

        for entity in &self.entities {
            self.phase.set(TickPhase::Fetching);
            let stable_id = entity.stable_id.as_str();
            let latest = {
                let filter = &*novelty;
                self.fetcher
                    .fetch_latest_match(stable_id, self.game, |id| {
                        filter.classify(stable_id, self.game, id).should_notify()
                    })
                    .await
            };

            self.phase.set(TickPhase::Filtering);
            let item = match latest {
                Ok(LatestMatch::Detailed(item)) => item,
                Ok(LatestMatch::Undetailed(id)) => {
                    report.fetched += 1;
                    if novelty.evaluate(stable_id, self.game, &id) == Verdict::Baseline {
                        report.baselined += 1;
                    } else {
                        report.unchanged += 1;
                    }
                    continue;
                }
                Ok(LatestMatch::NoHistory) => {
                    novelty.observe_empty(stable_id, self.game);
                    report.unchanged += 1;
                    continue;
                }
                Err(e) => {
                    report.fetch_failures += 1;
                    log_fetch_failure(category, entity, &e);
                    continue;
                }
            };
            report.fetched += 1;

            match novelty.evaluate(stable_id, self.game, &item.id) {
                Verdict::Admit => report.admitted += 1,
                Verdict::Baseline => {
                    report.baselined += 1;
                    continue;
                }
                Verdict::Duplicate => {
                    report.unchanged += 1;
                    continue;
                }
            }

            self.phase.set(TickPhase::Notifying);
            self.outbox
                .deliver(entity, &item, destination.as_ref(), &mut report)
                .await;
        }

        self.phase.set(TickPhase::Idle);
        report.finish()
    }
}

/// New-purchase polling for storefront accounts
pub struct PurchasePipeline {
    entities: Vec<TrackedEntity>,
    fetcher: TitleFetcher,
    novelty: Mutex<PurchaseNovelty>,
    outbox: Outbox,
    phase: PhaseCell,
}

impl PurchasePipeline {
    pub fn new(
        entities: Vec<TrackedEntity>,
        api: Arc<dyn StorefrontApi>,
        novelty: PurchaseNovelty,
        chat: Arc<dyn ChatPlatform>,
        channel_id: Option<u64>,
    ) -> Self {
        Self {
            entities,
            fetcher: TitleFetcher::new(api),
            novelty: Mutex::new(novelty),
            outbox: Outbox {
                category: Category::Storefront,
                chat,
                channel_id,
            },
            phase: PhaseCell::new(Category::Storefront),
        }
    }

    /// Retained app ids for an account, oldest first (inspection and tests)
    pub async fn remembered_titles(&self, stable_id: &str) -> Vec<u64> {
        self.novelty
            .lock()
            .await
            .memory(stable_id)
            .map(|memory| memory.ids().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl PollCategory for PurchasePipeline {
    fn category(&self) -> Category {
        Category::Storefront
    }

    fn phase(&self) -> TickPhase {
        self.phase.get()
    }

    async fn run_tick(&self, trigger: TickTrigger) -> TickReport {
        let mut novelty = self.novelty.lock().await;
        let category = self.category();
        let mut report = TickReport::start(category, trigger, self.entities.len());

        let destination = self.outbox.destination().await;
        report.destination_missing = destination.is_none();

        for entity in &self.entities {
            self.phase.set(TickPhase::Fetching);
            let titles = match self.fetcher.fetch_recent_titles(&entity.stable_id).await {
                Ok(titles) => titles,
                Err(e) => {
                    report.fetch_failures += 1;
                    log_fetch_failure(category, entity, &e);
                    continue;
                }
            };
            report.fetched += titles.len();

            self.phase.set(TickPhase::Filtering);
            let purchases = novelty.evaluate_titles(&entity.stable_id, &titles);
            report.unchanged += titles.len() - purchases.len();
            if purchases.is_empty() {
                continue;
            }
            report.admitted += purchases.len();

            self.phase.set(TickPhase::Notifying);
            let player = self.fetcher.fetch_player_name(&entity.stable_id).await;
            let named = entity.with_display_name(player);
            for item in &purchases {
                self.outbox
                    .deliver(&named, item, destination.as_ref(), &mut report)
                    .await;
            }
        }

        self.phase.set(TickPhase::Idle);
        report.finish()
    }
}
