//! Steam Web API adapter: recently played titles and profile summaries.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::truncate;
use crate::domain::{ProfileSummary, RecentTitle};
use crate::error::{FetchFailure, FetchResult, GameWatchError, Result};
use crate::ports::StorefrontApi;

const DEFAULT_STEAM_API_BASE: &str = "https://api.steampowered.com";

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    response: T,
}

#[derive(Debug, Default, Deserialize)]
struct RecentlyPlayed {
    #[serde(default)]
    games: Vec<RecentGame>,
}

#[derive(Debug, Deserialize)]
struct RecentGame {
    appid: u64,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    playtime_2weeks: u64,
}

#[derive(Debug, Default, Deserialize)]
struct PlayerSummaries {
    #[serde(default)]
    players: Vec<PlayerSummary>,
}

#[derive(Debug, Deserialize)]
struct PlayerSummary {
    #[serde(default)]
    personaname: Option<String>,
}

#[derive(Clone)]
pub struct SteamClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl SteamClient {
    pub fn new(api_key: &str, timeout: Duration) -> Result<Self> {
        Self::with_base_url(api_key, DEFAULT_STEAM_API_BASE, timeout)
    }

    pub fn with_base_url(api_key: &str, base_url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .user_agent("gamewatch/0.1")
            .timeout(timeout)
            .build()
            .map_err(|e| GameWatchError::Internal(format!("failed to build Steam HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.trim().to_string(),
        })
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        path: &str,
        query: &[(&str, &str)],
    ) -> FetchResult<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Steam GET {}", path);

        let resp = self
            .http
            .get(&url)
            .query(&[("key", self.api_key.as_str()), ("format", "json")])
            .query(query)
            .send()
            .await
            .map_err(|e| FetchFailure::transport(endpoint, &e))?;
        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| FetchFailure::transport(endpoint, &e))?;

        if !status.is_success() {
            return Err(FetchFailure::status(endpoint, status.as_u16(), truncate(&text)));
        }

        serde_json::from_str(&text).map_err(|e| FetchFailure::decode(endpoint, e))
    }
}

#[async_trait]
impl StorefrontApi for SteamClient {
    async fn list_recently_played_titles(&self, stable_id: &str) -> FetchResult<Vec<RecentTitle>> {
        let body: Envelope<RecentlyPlayed> = self
            .get(
                "steam recently played",
                "/IPlayerService/GetRecentlyPlayedGames/v1/",
                &[("steamid", stable_id)],
            )
            .await?;

        Ok(body
            .response
            .games
            .into_iter()
            .map(|g| RecentTitle {
                app_id: g.appid,
                name: g.name.unwrap_or_else(|| format!("App {}", g.appid)),
                recent_minutes: g.playtime_2weeks,
            })
            .collect())
    }

    async fn get_profile_summary(&self, stable_id: &str) -> FetchResult<ProfileSummary> {
        let body: Envelope<PlayerSummaries> = self
            .get(
                "steam player summaries",
                "/ISteamUser/GetPlayerSummaries/v2/",
                &[("steamids", stable_id)],
            )
            .await?;

        Ok(ProfileSummary {
            display_name: body
                .response
                .players
                .into_iter()
                .next()
                .and_then(|p| p.personaname),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recently_played_decode() {
        let raw = r#"{"response":{"total_count":2,"games":[
            {"appid":620,"name":"Portal 2","playtime_2weeks":12,"playtime_forever":12},
            {"appid":440,"playtime_forever":900}
        ]}}"#;
        let body: Envelope<RecentlyPlayed> = serde_json::from_str(raw).unwrap();
        assert_eq!(body.response.games.len(), 2);
        assert_eq!(body.response.games[0].playtime_2weeks, 12);
        assert_eq!(body.response.games[1].playtime_2weeks, 0);
        assert!(body.response.games[1].name.is_none());
    }

    #[test]
    fn test_empty_recently_played_decode() {
        let body: Envelope<RecentlyPlayed> = serde_json::from_str(r#"{"response":{}}"#).unwrap();
        assert!(body.response.games.is_empty());
    }

    #[test]
    fn test_player_summary_decode() {
        let raw = r#"{"response":{"players":[{"steamid":"1","personaname":"gaben"}]}}"#;
        let body: Envelope<PlayerSummaries> = serde_json::from_str(raw).unwrap();
        assert_eq!(body.response.players[0].personaname.as_deref(), Some("gaben"));
    }
}
