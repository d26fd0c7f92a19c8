//! In-memory upstreams and chat sink for driving pipelines end to end.
#![allow(dead_code)]

use async_trait::async_trait;
use gamewatch::domain::{
    ChannelHandle, MatchGame, NotificationPayload, ProfileSummary, RecentTitle,
};
use gamewatch::error::{FetchFailure, FetchResult, GameWatchError, Result};
use gamewatch::ports::{ChatPlatform, MatchApi, StorefrontApi};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub const LOL_CHANNEL: u64 = 111;
pub const VAL_CHANNEL: u64 = 222;
pub const STEAM_CHANNEL: u64 = 333;

pub fn league_detail(puuid: &str, champion: &str) -> Value {
    json!({
        "info": {
            "gameMode": "CLASSIC",
            "gameCreation": 1_700_000_000_000i64,
            "participants": [
                {"puuid": puuid, "championName": champion, "kills": 5, "deaths": 1, "assists": 8, "win": true}
            ]
        }
    })
}

pub fn valorant_detail(puuid: &str, agent: &str) -> Value {
    json!({
        "metadata": {"mode": "Competitive", "game_start": 1_700_000_000_000i64},
        "players": [
            {"puuid": puuid, "character": agent, "stats": {"kills": 20, "deaths": 10, "assists": 4}}
        ]
    })
}

/// Match history keyed by (puuid, game), newest match only
#[derive(Default)]
pub struct FakeRiot {
    latest: Mutex<HashMap<(String, MatchGame), String>>,
    details: Mutex<HashMap<String, Value>>,
    failing: Mutex<HashSet<String>>,
    detail_calls: AtomicUsize,
}

impl FakeRiot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn play(&self, puuid: &str, game: MatchGame, match_id: &str, detail: Value) {
        self.latest
            .lock()
            .unwrap()
            .insert((puuid.to_string(), game), match_id.to_string());
        self.details
            .lock()
            .unwrap()
            .insert(match_id.to_string(), detail);
    }

    pub fn fail_for(&self, puuid: &str) {
        self.failing.lock().unwrap().insert(puuid.to_string());
    }

    pub fn recover(&self, puuid: &str) {
        self.failing.lock().unwrap().remove(puuid);
    }

    pub fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MatchApi for FakeRiot {
    async fn list_recent_match_ids(
        &self,
        game: MatchGame,
        stable_id: &str,
        limit: usize,
    ) -> FetchResult<Vec<String>> {
        if self.failing.lock().unwrap().contains(stable_id) {
            return Err(FetchFailure::status("match ids", 503, "service unavailable"));
        }
        Ok(self
            .latest
            .lock()
            .unwrap()
            .get(&(stable_id.to_string(), game))
            .cloned()
            .into_iter()
            .take(limit)
            .collect())
    }

    async fn get_match_detail(&self, _game: MatchGame, match_id: &str) -> FetchResult<Value> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        self.details
            .lock()
            .unwrap()
            .get(match_id)
            .cloned()
            .ok_or_else(|| FetchFailure::status("match detail", 404, "not found"))
    }
}

/// Recently played listings and persona names keyed by SteamID64
#[derive(Default)]
pub struct FakeSteam {
    titles: Mutex<HashMap<String, Vec<RecentTitle>>>,
    names: Mutex<HashMap<String, String>>,
    failing: Mutex<HashSet<String>>,
    profile_calls: AtomicUsize,
}

impl FakeSteam {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_titles(&self, steam_id: &str, titles: &[(u64, &str, u64)]) {
        let titles = titles
            .iter()
            .map(|(app_id, name, minutes)| RecentTitle {
                app_id: *app_id,
                name: name.to_string(),
                recent_minutes: *minutes,
            })
            .collect();
        self.titles
            .lock()
            .unwrap()
            .insert(steam_id.to_string(), titles);
    }

    pub fn set_name(&self, steam_id: &str, name: &str) {
        self.names
            .lock()
            .unwrap()
            .insert(steam_id.to_string(), name.to_string());
    }

    pub fn fail_for(&self, steam_id: &str) {
        self.failing.lock().unwrap().insert(steam_id.to_string());
    }

    pub fn recover(&self, steam_id: &str) {
        self.failing.lock().unwrap().remove(steam_id);
    }

    pub fn profile_calls(&self) -> usize {
        self.profile_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StorefrontApi for FakeSteam {
    async fn list_recently_played_titles(&self, stable_id: &str) -> FetchResult<Vec<RecentTitle>> {
        if self.failing.lock().unwrap().contains(stable_id) {
            return Err(FetchFailure::status("recently played", 503, "service unavailable"));
        }
        Ok(self
            .titles
            .lock()
            .unwrap()
            .get(stable_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_profile_summary(&self, stable_id: &str) -> FetchResult<ProfileSummary> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        Ok(ProfileSummary {
            display_name: self.names.lock().unwrap().get(stable_id).cloned(),
        })
    }
}

/// Chat sink that records what was sent and can be told to fail or stall
pub struct RecordingChat {
    ready: AtomicBool,
    failing: AtomicBool,
    send_delay: Option<Duration>,
    sent: Mutex<Vec<(u64, NotificationPayload)>>,
}

impl RecordingChat {
    pub fn ready() -> Self {
        Self {
            ready: AtomicBool::new(true),
            failing: AtomicBool::new(false),
            send_delay: None,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn not_ready() -> Self {
        let chat = Self::ready();
        chat.ready.store(false, Ordering::SeqCst);
        chat
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            send_delay: Some(delay),
            ..Self::ready()
        }
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<(u64, NotificationPayload)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn titles(&self) -> Vec<String> {
        self.sent().into_iter().map(|(_, p)| p.title).collect()
    }
}

#[async_trait]
impl ChatPlatform for RecordingChat {
    async fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    async fn resolve_destination(&self, channel_id: u64) -> Option<ChannelHandle> {
        [LOL_CHANNEL, VAL_CHANNEL, STEAM_CHANNEL]
            .contains(&channel_id)
            .then(|| ChannelHandle {
                id: channel_id,
                name: None,
            })
    }

    async fn send(&self, channel: &ChannelHandle, payload: &NotificationPayload) -> Result<()> {
        if let Some(delay) = self.send_delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(GameWatchError::Send("HTTP 500".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((channel.id, payload.clone()));
        Ok(())
    }
}
