//! Stateless upstream queries feeding the novelty filters.

use std::sync::Arc;
use tracing::debug;

use crate::domain::{FetchedItem, MatchGame};
use crate::error::FetchResult;
use crate::ports::{MatchApi, StorefrontApi};

const UNKNOWN_PLAYER: &str = "Unknown Player";

/// Result of polling a player's newest match
#[derive(Debug, Clone, PartialEq)]
pub enum LatestMatch {
    /// The player has no match history
    NoHistory,
    /// Newest id, with its detail fetch skipped
    Undetailed(String),
    /// Newest match with detail
    Detailed(FetchedItem),
}

pub struct MatchFetcher {
    api: Arc<dyn MatchApi>,
}

impl MatchFetcher {
    pub fn new(api: Arc<dyn MatchApi>) -> Self {
        Self { api }
    }

    /// Latest completed match for a player.
    ///
    /// The detail is fetched only when `wants_detail` accepts the newest id,
    /// so already-known and silently adopted matches cost one request.
    pub async fn fetch_latest_match<F>(
        &self,
        stable_id: &str,
        game: MatchGame,
        wants_detail: F,
    ) -> FetchResult<LatestMatch>
    where
        F: Fn(&str) -> bool + Send,
    {
        let ids = self.api.list_recent_match_ids(game, stable_id, 1).await?;
        let Some(latest) = ids.into_iter().next() else {
            debug!("{} has no {} match history", stable_id, game);
            return Ok(LatestMatch::NoHistory);
        };

        if !wants_detail(&latest) {
            return Ok(LatestMatch::Undetailed(latest));
        }

        let detail = self.api.get_match_detail(game, &latest).await?;
        Ok(LatestMatch::Detailed(FetchedItem::match_detail(latest, detail)))
    }
}

pub struct TitleFetcher {
    api: Arc<dyn StorefrontApi>,
}

impl TitleFetcher {
    pub fn new(api: Arc<dyn StorefrontApi>) -> Self {
        Self { api }
    }

    /// Titles with recent playtime, in API order
    pub async fn fetch_recent_titles(&self, stable_id: &str) -> FetchResult<Vec<FetchedItem>> {
        let titles = self.api.list_recently_played_titles(stable_id).await?;
        Ok(titles
            .into_iter()
            .filter(|t| t.recent_minutes > 0)
            .map(|t| FetchedItem::title(t.app_id, t.name, t.recent_minutes))
            .collect())
    }

    /// Current profile name, falling back to a placeholder on any failure
    pub async fn fetch_player_name(&self, stable_id: &str) -> String {
        match self.api.get_profile_summary(stable_id).await {
            Ok(summary) => summary
                .display_name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_PLAYER.to_string()),
            Err(e) => {
                debug!("Steam profile lookup for {} failed: {}", stable_id, e);
                UNKNOWN_PLAYER.to_string()
            }
        }
    }
}
