//! Seams between the tracking core and the outside world.
//!
//! Adapters in `crate::adapters` implement these against Riot, Steam and
//! Discord; tests implement them in memory.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::{
    AccountRecord, ChannelHandle, MatchGame, NotificationPayload, ProfileSummary, RecentTitle,
};
use crate::error::{FetchResult, Result};

/// Display-name to stable-id lookup for match ecosystems
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountApi: Send + Sync {
    async fn lookup_account(&self, game_name: &str, tag_line: &str) -> FetchResult<AccountRecord>;
}

/// Read-only match history of a match ecosystem
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MatchApi: Send + Sync {
    /// Most recent match ids first
    async fn list_recent_match_ids(
        &self,
        game: MatchGame,
        stable_id: &str,
        limit: usize,
    ) -> FetchResult<Vec<String>>;

    async fn get_match_detail(&self, game: MatchGame, match_id: &str) -> FetchResult<Value>;
}

/// Read-only storefront account data
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StorefrontApi: Send + Sync {
    async fn list_recently_played_titles(&self, stable_id: &str) -> FetchResult<Vec<RecentTitle>>;

    async fn get_profile_summary(&self, stable_id: &str) -> FetchResult<ProfileSummary>;
}

/// Outbound chat connection
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    async fn is_ready(&self) -> bool;

    async fn resolve_destination(&self, channel_id: u64) -> Option<ChannelHandle>;

    async fn send(&self, channel: &ChannelHandle, payload: &NotificationPayload) -> Result<()>;
}
