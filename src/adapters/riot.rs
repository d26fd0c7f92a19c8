//! Riot Games REST adapter: account lookup plus League and Valorant match history.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::truncate;
use crate::domain::{AccountRecord, MatchGame};
use crate::error::{FetchFailure, FetchResult, GameWatchError, Result};
use crate::ports::{AccountApi, MatchApi};

pub const DEFAULT_RIOT_REGION: &str = "americas";
pub const RIOT_REGIONS: [&str; 4] = ["americas", "asia", "europe", "sea"];

#[derive(Clone)]
pub struct RiotClient {
    http: Client,
    base_url: String,
}

impl RiotClient {
    /// Client routed to `https://{region}.api.riotgames.com`
    pub fn new(api_key: &str, region: &str, timeout: Duration) -> Result<Self> {
        let base_url = format!("https://{}.api.riotgames.com", region.trim().to_lowercase());
        Self::with_base_url(api_key, &base_url, timeout)
    }

    pub fn with_base_url(api_key: &str, base_url: &str, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "X-Riot-Token",
            HeaderValue::from_str(api_key.trim())
                .map_err(|e| GameWatchError::Validation(format!("invalid Riot API key: {}", e)))?,
        );

        let http = Client::builder()
            .user_agent("gamewatch/0.1")
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| GameWatchError::Internal(format!("failed to build Riot HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json(
        &self,
        endpoint: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> FetchResult<Value> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Riot GET {}", path);

        let resp = self
            .http
            .get(&url)
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

    fn match_ids_from_response(game: MatchGame, body: &Value, limit: usize) -> Vec<String> {
        match game {
            MatchGame::League => body
                .as_array()
                .map(|ids| {
                    ids.iter()
                        .filter_map(|id| id.as_str().map(str::to_string))
                        .take(limit)
                        .collect()
                })
                .unwrap_or_default(),
            MatchGame::Valorant => body["history"]
                .as_array()
                .map(|history| {
                    history
                        .iter()
                        .filter_map(|entry| entry["matchId"].as_str().map(str::to_string))
                        .take(limit)
                        .collect()
                })
                .unwrap_or_default(),
        }
    }
}

#[async_trait]
impl AccountApi for RiotClient {
    async fn lookup_account(&self, game_name: &str, tag_line: &str) -> FetchResult<AccountRecord> {
        let path = format!(
            "/riot/account/v1/accounts/by-riot-id/{}/{}",
            urlencoding::encode(game_name),
            urlencoding::encode(tag_line)
        );
        let body = self.get_json("riot account", &path, &[]).await?;

        Ok(AccountRecord {
            puuid: body["puuid"].as_str().map(str::to_string),
        })
    }
}

#[async_trait]
impl MatchApi for RiotClient {
    async fn list_recent_match_ids(
        &self,
        game: MatchGame,
        stable_id: &str,
        limit: usize,
    ) -> FetchResult<Vec<String>> {
        let puuid = urlencoding::encode(stable_id);
        let body = match game {
            MatchGame::League => {
                let path = format!("/lol/match/v5/matches/by-puuid/{}/ids", puuid);
                self.get_json(
                    "lol match ids",
                    &path,
                    &[("start", "0".to_string()), ("count", limit.to_string())],
                )
                .await?
            }
            MatchGame::Valorant => {
                let path = format!("/val/match/v1/matchlists/by-puuid/{}", puuid);
                self.get_json("val matchlist", &path, &[]).await?
            }
        };

        Ok(Self::match_ids_from_response(game, &body, limit))
    }

    async fn get_match_detail(&self, game: MatchGame, match_id: &str) -> FetchResult<Value> {
        let match_id = urlencoding::encode(match_id);
        match game {
            MatchGame::League => {
                let path = format!("/lol/match/v5/matches/{}", match_id);
                self.get_json("lol match detail", &path, &[]).await
            }
            MatchGame::Valorant => {
                let path = format!("/val/match/v1/matches/{}", match_id);
                self.get_json("val match detail", &path, &[]).await
            }
        }
    }
}
