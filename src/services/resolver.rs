//! Startup binding of tracked display names to stable upstream ids.

use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::{Ecosystem, TrackedEntity};
use crate::error::ResolutionFailure;
use crate::ports::AccountApi;

pub struct EntityResolver {
    accounts: Arc<dyn AccountApi>,
}

/// Split "name#tag" (or the older "name/tag") into its Riot id parts.
///
/// Percent-encoded names such as `Some%20Name#NA1` are decoded first.
pub fn parse_riot_id(display_name: &str) -> Option<(String, String)> {
    let decoded = urlencoding::decode(display_name.trim()).ok()?;
    let (name, tag) = decoded.rsplit_once('#').or_else(|| decoded.rsplit_once('/'))?;
    let (name, tag) = (name.trim(), tag.trim());
    if name.is_empty() || tag.is_empty() {
        return None;
    }
    Some((name.to_string(), tag.to_string()))
}

impl EntityResolver {
    pub fn new(accounts: Arc<dyn AccountApi>) -> Self {
        Self { accounts }
    }

    pub async fn resolve(
        &self,
        display_name: &str,
        ecosystem: Ecosystem,
    ) -> Result<TrackedEntity, ResolutionFailure> {
        match ecosystem {
            Ecosystem::Storefront => resolve_storefront_id(display_name),
            Ecosystem::MatchGame => self.resolve_riot_id(display_name).await,
        }
    }

    /// Resolve every name, logging and dropping the ones that fail
    pub async fn resolve_all(&self, display_names: &[String], ecosystem: Ecosystem) -> Vec<TrackedEntity> {
        let mut entities = Vec::with_capacity(display_names.len());
        for display_name in display_names {
            match self.resolve(display_name, ecosystem).await {
                Ok(entity) => {
                    info!(
                        "Tracking {} player: {} ({})",
                        ecosystem, entity.display_name, entity.stable_id
                    );
                    if entities
                        .iter()
                        .any(|e: &TrackedEntity| e.stable_id == entity.stable_id)
                    {
                        warn!("{} resolves to an already tracked id, skipping", display_name);
                        continue;
                    }
                    entities.push(entity);
                }
                Err(e) => warn!("Not tracking {}: {}", display_name, e),
            }
        }
        entities
    }

    async fn resolve_riot_id(&self, display_name: &str) -> Result<TrackedEntity, ResolutionFailure> {
        let (game_name, tag_line) =
            parse_riot_id(display_name).ok_or_else(|| ResolutionFailure::Malformed {
                display_name: display_name.to_string(),
                reason: "expected name#tag".to_string(),
            })?;

        let record = self
            .accounts
            .lookup_account(&game_name, &tag_line)
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    ResolutionFailure::NotFound {
                        display_name: display_name.to_string(),
                    }
                } else {
                    ResolutionFailure::UpstreamUnavailable {
                        display_name: display_name.to_string(),
                        reason: e.to_string(),
                    }
                }
            })?;

        let puuid = record
            .puuid
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| ResolutionFailure::Malformed {
                display_name: display_name.to_string(),
                reason: "account response has no puuid".to_string(),
            })?;

        Ok(TrackedEntity::new(
            format!("{}#{}", game_name, tag_line),
            puuid,
            Ecosystem::MatchGame,
        ))
    }
}

/// Steam ids are already stable; only the shape is checked
pub fn resolve_storefront_id(display_name: &str) -> Result<TrackedEntity, ResolutionFailure> {
    let id = display_name.trim();
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) {
        return Err(ResolutionFailure::Malformed {
            display_name: display_name.to_string(),
            reason: "expected a numeric Steam id".to_string(),
        });
    }
    Ok(TrackedEntity::new(id, id, Ecosystem::Storefront))
}
