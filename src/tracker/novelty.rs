use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use super::purchase_memory::PurchaseMemory;
use super::watermark::WatermarkStore;
use crate::domain::{FetchedItem, MatchGame};

/// Titles with less recent playtime than this on first sighting count as purchases
pub const DEFAULT_PURCHASE_RECENCY_MINUTES: u64 = 30;

/// What to do with the first item seen for an entity after startup.
///
/// `Notify` treats a missing watermark as "anything is new", so every
/// restart re-announces each player's current latest match. `Baseline`
/// silently adopts that first item and only announces later ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FirstSightPolicy {
    #[default]
    Notify,
    Baseline,
}

impl FirstSightPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FirstSightPolicy::Notify => "notify",
            FirstSightPolicy::Baseline => "baseline",
        }
    }
}

impl fmt::Display for FirstSightPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FirstSightPolicy {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "notify" => Ok(FirstSightPolicy::Notify),
            "baseline" => Ok(FirstSightPolicy::Baseline),
            other => Err(format!(
                "unknown first-sight policy '{}'; expected notify|baseline",
                other
            )),
        }
    }
}

/// Outcome of checking one candidate against tracked state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// New item; state advanced, notify
    Admit,
    /// First item for the entity under `FirstSightPolicy::Baseline`; state advanced, stay quiet
    Baseline,
    /// Already reported; state untouched
    Duplicate,
}

impl Verdict {
    pub fn should_notify(&self) -> bool {
        matches!(self, Verdict::Admit)
    }
}

/// Novelty filter for match games.
///
/// The watermark for a (player, game) pair only moves when a candidate id
/// differs from it, and only to that candidate, so a given match id is
/// admitted at most once while it stays on top.
#[derive(Debug, Clone)]
pub struct MatchNovelty {
    policy: FirstSightPolicy,
    marks: WatermarkStore,
}

impl MatchNovelty {
    pub fn new(policy: FirstSightPolicy) -> Self {
        Self {
            policy,
            marks: WatermarkStore::new(),
        }
    }

    /// Current watermark for a player and game
    pub fn known(&self, stable_id: &str, game: MatchGame) -> Option<&str> {
        self.marks.get(stable_id, game)
    }

    /// Verdict a candidate would get, without touching state
    pub fn classify(&self, stable_id: &str, game: MatchGame, candidate_id: &str) -> Verdict {
        if !self.marks.is_observed(stable_id, game) {
            return match self.policy {
                FirstSightPolicy::Notify => Verdict::Admit,
                FirstSightPolicy::Baseline => Verdict::Baseline,
            };
        }
        match self.marks.get(stable_id, game) {
            Some(mark) if mark == candidate_id => Verdict::Duplicate,
            _ => Verdict::Admit,
        }
    }

    /// A successful fetch found no history; later matches are genuinely new
    pub fn observe_empty(&mut self, stable_id: &str, game: MatchGame) {
        self.marks.observe_empty(stable_id, game);
    }

    pub fn evaluate(&mut self, stable_id: &str, game: MatchGame, candidate_id: &str) -> Verdict {
        let verdict = self.classify(stable_id, game, candidate_id);
        match verdict {
            Verdict::Duplicate => {}
            Verdict::Admit => {
                let previous = self.marks.advance(stable_id, game, candidate_id);
                debug!(
                    "{} watermark for {} moved {:?} -> {}",
                    game, stable_id, previous, candidate_id
                );
            }
            Verdict::Baseline => {
                self.marks.advance(stable_id, game, candidate_id);
                debug!(
                    "{} baseline for {} set to {}",
                    game, stable_id, candidate_id
                );
            }
        }
        verdict
    }
}

/// Novelty filter for storefront purchases.
///
/// # How it works
/// 1. Every title is recorded in the account's purchase memory, in API order
/// 2. A title is a purchase only if it was absent before this tick's insert
///    and its recent playtime is below the recency threshold
/// 3. The memory cap is enforced after the whole tick is recorded
#[derive(Debug, Clone)]
pub struct PurchaseNovelty {
    policy: FirstSightPolicy,
    memory_cap: usize,
    recency_threshold_minutes: u64,
    accounts: HashMap<String, PurchaseMemory>,
}

impl PurchaseNovelty {
    pub fn new(policy: FirstSightPolicy, memory_cap: usize) -> Self {
        Self {
            policy,
            memory_cap,
            recency_threshold_minutes: DEFAULT_PURCHASE_RECENCY_MINUTES,
            accounts: HashMap::new(),
        }
    }

    pub fn with_recency_threshold(mut self, minutes: u64) -> Self {
        self.recency_threshold_minutes = minutes;
        self
    }

    pub fn memory(&self, stable_id: &str) -> Option<&PurchaseMemory> {
        self.accounts.get(stable_id)
    }

    /// Record a tick's titles for one account and return the ones to announce
    pub fn evaluate_titles(&mut self, stable_id: &str, titles: &[FetchedItem]) -> Vec<FetchedItem> {
        let first_sight = !self.accounts.contains_key(stable_id);
        let memory = self
            .accounts
            .entry(stable_id.to_string())
            .or_insert_with(|| PurchaseMemory::new(self.memory_cap));

        let candidates: Vec<(&FetchedItem, u64)> = titles
            .iter()
            .filter_map(|item| item.app_id().map(|app_id| (item, app_id)))
            .collect();
        let app_ids: Vec<u64> = candidates.iter().map(|(_, app_id)| *app_id).collect();
        let fresh = memory.observe(&app_ids);

        if first_sight && self.policy == FirstSightPolicy::Baseline {
            debug!(
                "Steam baseline for {} recorded {} titles",
                stable_id,
                app_ids.len()
            );
            return Vec::new();
        }

        let threshold = self.recency_threshold_minutes;
        candidates
            .into_iter()
            .zip(fresh)
            .filter(|((item, _), is_fresh)| {
                *is_fresh && item.recency_minutes.map_or(false, |m| m < threshold)
            })
            .map(|((item, _), _)| item.clone())
            .collect()
    }
}
