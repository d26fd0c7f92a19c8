//! Poll scheduler: one repeating loop per category, gated on chat readiness.
//!
//! A loop awaits its category's `run_tick` before waiting for the next
//! interval, so ticks of one category never overlap. Different categories
//! run on independent tasks.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::pipeline::{PollCategory, TickReport, TickTrigger};
use crate::domain::{Category, TickPhase};
use crate::error::{GameWatchError, Result};
use crate::ports::ChatPlatform;

/// Running totals for one category
#[derive(Debug, Clone, Default, Serialize)]
pub struct CategoryStats {
    pub scheduled_ticks: u64,
    pub manual_ticks: u64,
    pub notifications_sent: u64,
    pub fetch_failures: u64,
    pub last_tick: Option<TickReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategorySnapshot {
    pub category: Category,
    pub cadence_secs: u64,
    pub phase: TickPhase,
    pub busy: bool,
    pub stats: CategoryStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct SchedulerSnapshot {
    pub ready: bool,
    pub started_at: DateTime<Utc>,
    pub uptime_seconds: u64,
    pub categories: Vec<CategorySnapshot>,
}

struct ScheduledCategory {
    pipeline: Arc<dyn PollCategory>,
    cadence: Duration,
    stats: RwLock<CategoryStats>,
}

pub struct PollScheduler {
    categories: Vec<ScheduledCategory>,
    ready: AtomicBool,
    started_at: DateTime<Utc>,
    readiness_retry: Duration,
}

impl PollScheduler {
    pub fn new(readiness_retry: Duration) -> Self {
        Self {
            categories: Vec::new(),
            ready: AtomicBool::new(false),
            started_at: Utc::now(),
            readiness_retry,
        }
    }

    pub fn with_category(mut self, pipeline: Arc<dyn PollCategory>, cadence: Duration) -> Self {
        self.categories.push(ScheduledCategory {
            pipeline,
            cadence,
            stats: RwLock::new(CategoryStats::default()),
        });
        self
    }

    pub fn categories(&self) -> Vec<Category> {
        self.categories.iter().map(|c| c.pipeline.category()).collect()
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Block until the chat platform reports ready.
    ///
    /// Returns `false` if shutdown was requested first.
    pub async fn wait_until_ready(
        &self,
        chat: &dyn ChatPlatform,
        shutdown: &mut watch::Receiver<bool>,
    ) -> bool {
        loop {
            if *shutdown.borrow() {
                return false;
            }
            if chat.is_ready().await {
                self.ready.store(true, Ordering::SeqCst);
                info!("Chat platform ready");
                return true;
            }

            debug!(
                "Chat platform not ready, retrying in {}s",
                self.readiness_retry.as_secs()
            );
            tokio::select! {
                _ = time::sleep(self.readiness_retry) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        return false;
                    }
                }
            }
        }
    }

    /// Run every category loop until shutdown.
    pub async fn run(self: Arc<Self>, chat: Arc<dyn ChatPlatform>, mut shutdown: watch::Receiver<bool>) {
        if !self.wait_until_ready(chat.as_ref(), &mut shutdown).await {
            info!("Scheduler stopped before the chat platform became ready");
            return;
        }

        let mut handles = Vec::with_capacity(self.categories.len());
        for index in 0..self.categories.len() {
            let scheduler = Arc::clone(&self);
            let shutdown = shutdown.clone();
            handles.push(tokio::spawn(async move {
                scheduler.run_category_loop(index, shutdown).await
            }));
        }

        for handle in handles {
            if let Err(e) = handle.await {
                error!("Poll loop task failed: {}", e);
            }
        }
        info!("Scheduler stopped");
    }

    async fn run_category_loop(&self, index: usize, mut shutdown: watch::Receiver<bool>) {
        let scheduled = &self.categories[index];
        let category = scheduled.pipeline.category();
        info!(
            "Starting {} poll loop (interval: {}s)",
            category,
            scheduled.cadence.as_secs_f64()
        );

        let mut ticker = time::interval(scheduled.cadence);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.changed() => break,
            }
            if *shutdown.borrow() {
                break;
            }

            let report = scheduled.pipeline.run_tick(TickTrigger::Scheduled).await;
            self.record(scheduled, &report).await;
        }

        info!("{} poll loop stopped", category);
    }

    /// Run the same pipeline once outside the schedule.
    ///
    /// `None` runs every category. Waits for any in-flight scheduled tick of
    /// the same category to finish first.
    pub async fn trigger(&self, filter: Option<Category>) -> Result<Vec<TickReport>> {
        if !self.is_ready() {
            return Err(GameWatchError::NotReady);
        }

        let mut reports = Vec::new();
        for scheduled in &self.categories {
            if !scheduled.pipeline.category().matches_filter(filter) {
                continue;
            }
            let report = scheduled.pipeline.run_tick(TickTrigger::Manual).await;
            self.record(scheduled, &report).await;
            reports.push(report);
        }

        if reports.is_empty() {
            if let Some(category) = filter {
                warn!("Manual check for {} matched no tracked category", category);
            }
        }
        Ok(reports)
    }

    async fn record(&self, scheduled: &ScheduledCategory, report: &TickReport) {
        if report.sent > 0 || report.fetch_failures > 0 || report.send_failures > 0 {
            info!(
                "{} tick ({:?}): {} entities, {} new, {} sent, {} fetch failures, {} send failures",
                report.category,
                report.trigger,
                report.entities,
                report.admitted,
                report.sent,
                report.fetch_failures,
                report.send_failures
            );
        } else {
            debug!(
                "{} tick ({:?}): nothing new across {} entities in {}ms",
                report.category, report.trigger, report.entities, report.elapsed_ms
            );
        }

        let mut stats = scheduled.stats.write().await;
        match report.trigger {
            TickTrigger::Scheduled => stats.scheduled_ticks += 1,
            TickTrigger::Manual => stats.manual_ticks += 1,
        }
        stats.notifications_sent += report.sent as u64;
        stats.fetch_failures += report.fetch_failures as u64;
        stats.last_tick = Some(report.clone());
    }

    pub async fn snapshot(&self) -> SchedulerSnapshot {
        let mut categories = Vec::with_capacity(self.categories.len());
        for scheduled in &self.categories {
            let phase = scheduled.pipeline.phase();
            categories.push(CategorySnapshot {
                category: scheduled.pipeline.category(),
                cadence_secs: scheduled.cadence.as_secs(),
                phase,
                busy: phase.is_busy(),
                stats: scheduled.stats.read().await.clone(),
            });
        }

        SchedulerSnapshot {
            ready: self.is_ready(),
            started_at: self.started_at,
            uptime_seconds: (Utc::now() - self.started_at).num_seconds().max(0) as u64,
            categories,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::MockChatPlatform;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    struct CountingCategory {
        category: Category,
        ticks: AtomicUsize,
    }

    #[async_trait]
    impl PollCategory for CountingCategory {
        fn category(&self) -> Category {
            self.category
        }

        fn phase(&self) -> TickPhase {
            TickPhase::Idle
        }

        async fn run_tick(&self, trigger: TickTrigger) -> TickReport {
            self.ticks.fetch_add(1, Ordering::SeqCst);
            TickReport {
                category: self.category,
                trigger,
                started_at: Utc::now(),
                elapsed_ms: 0,
                entities: 1,
                fetched: 1,
                unchanged: 0,
                admitted: 1,
                baselined: 0,
                sent: 1,
                fetch_failures: 0,
                render_failures: 0,
                send_failures: 0,
                destination_missing: false,
            }
        }
    }

    fn counting(category: Category) -> Arc<CountingCategory> {
        Arc::new(CountingCategory {
            category,
            ticks: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn test_trigger_requires_readiness() {
        let scheduler = PollScheduler::new(Duration::from_millis(10))
            .with_category(counting(Category::Storefront), Duration::from_secs(300));

        assert!(matches!(
            scheduler.trigger(None).await,
            Err(GameWatchError::NotReady)
        ));
    }

    #[tokio::test]
    async fn test_trigger_filters_categories() {
        let steam = counting(Category::Storefront);
        let lol = counting(Category::Match(crate::domain::MatchGame::League));
        let scheduler = PollScheduler::new(Duration::from_millis(10))
            .with_category(lol.clone(), Duration::from_secs(30))
            .with_category(steam.clone(), Duration::from_secs(300));

        let mut chat = MockChatPlatform::new();
        chat.expect_is_ready().returning(|| true);
        let (_tx, mut rx) = watch::channel(false);
        assert!(scheduler.wait_until_ready(&chat, &mut rx).await);

        let reports = scheduler.trigger(Some(Category::Storefront)).await.unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(steam.ticks.load(Ordering::SeqCst), 1);
        assert_eq!(lol.ticks.load(Ordering::SeqCst), 0);

        let reports = scheduler.trigger(None).await.unwrap();
        assert_eq!(reports.len(), 2);

        let snapshot = scheduler.snapshot().await;
        let steam_stats = &snapshot.categories[1].stats;
        assert_eq!(steam_stats.manual_ticks, 2);
        assert_eq!(steam_stats.notifications_sent, 2);
    }

    #[tokio::test]
    async fn test_readiness_gate_retries() {
        let scheduler = PollScheduler::new(Duration::from_millis(5));
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);

        let mut chat = MockChatPlatform::new();
        chat.expect_is_ready()
            .returning(move || seen.fetch_add(1, Ordering::SeqCst) >= 2);

        let (_tx, mut rx) = watch::channel(false);
        assert!(scheduler.wait_until_ready(&chat, &mut rx).await);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(scheduler.is_ready());
    }

    #[tokio::test]
    async fn test_readiness_gate_honours_shutdown() {
        let scheduler = PollScheduler::new(Duration::from_secs(60));
        let mut chat = MockChatPlatform::new();
        chat.expect_is_ready().returning(|| false);

        let (tx, mut rx) = watch::channel(false);
        let waiter = async { scheduler.wait_until_ready(&chat, &mut rx).await };
        let stopper = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            tx.send(true).unwrap();
        };
        let (ready, _) = tokio::join!(waiter, stopper);

        assert!(!ready);
        assert!(!scheduler.is_ready());
    }

    #[tokio::test(start_paused = true)]
    async fn test_loops_tick_on_cadence_until_shutdown() {
        let steam = counting(Category::Storefront);
        let scheduler = Arc::new(
            PollScheduler::new(Duration::from_millis(5))
                .with_category(steam.clone(), Duration::from_secs(300)),
        );

        let mut chat = MockChatPlatform::new();
        chat.expect_is_ready().returning(|| true);
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(Arc::clone(&scheduler).run(Arc::new(chat), rx));

        // first tick fires immediately, then every 300s
        tokio::time::sleep(Duration::from_secs(301)).await;
        assert_eq!(steam.ticks.load(Ordering::SeqCst), 2);

        tx.send(true).unwrap();
        handle.await.unwrap();

        let snapshot = scheduler.snapshot().await;
        assert_eq!(snapshot.categories[0].stats.scheduled_ticks, 2);
    }
}
