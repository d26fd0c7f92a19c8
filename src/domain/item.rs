use serde::Serialize;
use serde_json::Value;

/// What the fetcher hands to the novelty filter
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemPayload {
    /// Opaque match detail record, exactly as the match API returned it
    Match { detail: Value },
    /// Recently played storefront title
    Title { app_id: u64, name: String },
}

/// Transient fetch result, consumed within the tick that produced it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchedItem {
    pub id: String,
    pub payload: ItemPayload,
    /// Minutes played in the upstream's recent window (storefront only)
    pub recency_minutes: Option<u64>,
}

impl FetchedItem {
    pub fn match_detail(match_id: impl Into<String>, detail: Value) -> Self {
        Self {
            id: match_id.into(),
            payload: ItemPayload::Match { detail },
            recency_minutes: None,
        }
    }

    pub fn title(app_id: u64, name: impl Into<String>, recency_minutes: u64) -> Self {
        Self {
            id: app_id.to_string(),
            payload: ItemPayload::Title {
                app_id,
                name: name.into(),
            },
            recency_minutes: Some(recency_minutes),
        }
    }

    pub fn app_id(&self) -> Option<u64> {
        match &self.payload {
            ItemPayload::Title { app_id, .. } => Some(*app_id),
            ItemPayload::Match { .. } => None,
        }
    }
}

/// Row of the storefront's recently-played listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentTitle {
    pub app_id: u64,
    pub name: String,
    /// Minutes played during the last two weeks
    pub recent_minutes: u64,
}

/// Storefront profile, fetched only for the player's current name
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProfileSummary {
    pub display_name: Option<String>,
}

/// Riot account lookup result
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AccountRecord {
    pub puuid: Option<String>,
}
