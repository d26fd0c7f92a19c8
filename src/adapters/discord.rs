//! Discord REST notifications
//!
//! Posts rendered notifications as embeds through a bot token.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::truncate;
use crate::domain::{ChannelHandle, NotificationPayload};
use crate::error::{GameWatchError, Result};
use crate::ports::ChatPlatform;

const DEFAULT_DISCORD_API_BASE: &str = "https://discord.com/api/v10";

/// Discord bot client
pub struct DiscordNotifier {
    client: Client,
    base_url: String,
    ready: AtomicBool,
}

#[derive(Serialize)]
struct DiscordMessage<'a> {
    embeds: [DiscordEmbed<'a>; 1],
}

#[derive(Serialize)]
struct DiscordEmbed<'a> {
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    color: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<DiscordField<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    footer: Option<DiscordText<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thumbnail: Option<DiscordImage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<String>,
}

#[derive(Serialize)]
struct DiscordField<'a> {
    name: &'a str,
    value: &'a str,
    inline: bool,
}

#[derive(Serialize)]
struct DiscordText<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct DiscordImage<'a> {
    url: &'a str,
}

#[derive(Deserialize)]
struct DiscordChannel {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Deserialize)]
struct DiscordUser {
    #[serde(default)]
    username: Option<String>,
}

impl<'a> From<&'a NotificationPayload> for DiscordEmbed<'a> {
    fn from(payload: &'a NotificationPayload) -> Self {
        Self {
            title: &payload.title,
            description: payload.description.as_deref(),
            color: payload.color,
            fields: payload
                .fields
                .iter()
                .map(|f| DiscordField {
                    name: &f.name,
                    value: &f.value,
                    inline: f.inline,
                })
                .collect(),
            footer: payload.footer.as_deref().map(|text| DiscordText { text }),
            thumbnail: payload.thumbnail_url.as_deref().map(|url| DiscordImage { url }),
            timestamp: payload.timestamp.map(|t| t.to_rfc3339()),
        }
    }
}

impl DiscordNotifier {
    pub fn new(bot_token: &str, timeout: Duration) -> Result<Self> {
        Self::with_base_url(bot_token, DEFAULT_DISCORD_API_BASE, timeout)
    }

    pub fn with_base_url(bot_token: &str, base_url: &str, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bot {}", bot_token.trim()))
                .map_err(|e| GameWatchError::Validation(format!("invalid Discord token: {}", e)))?,
        );

        let client = Client::builder()
            .user_agent("DiscordBot (https://github.com/gamewatch, 0.1)")
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| GameWatchError::Internal(format!("failed to build Discord HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            ready: AtomicBool::new(false),
        })
    }

    /// Confirm the token against `/users/@me`
    async fn login(&self) -> bool {
        let url = format!("{}/users/@me", self.base_url);
        match self.client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => {
                let user = resp.json::<DiscordUser>().await.ok();
                info!(
                    "Logged in to Discord as {}",
                    user.and_then(|u| u.username)
                        .unwrap_or_else(|| "<unknown>".to_string())
                );
                true
            }
            Ok(resp) => {
                warn!("Discord login rejected: HTTP {}", resp.status());
                false
            }
            Err(e) => {
                warn!("Discord login request failed: {}", e);
                false
            }
        }
    }
}

#[async_trait]
impl ChatPlatform for DiscordNotifier {
    async fn is_ready(&self) -> bool {
        if self.ready.load(Ordering::SeqCst) {
            return true;
        }
        let ready = self.login().await;
        self.ready.store(ready, Ordering::SeqCst);
        ready
    }

    async fn resolve_destination(&self, channel_id: u64) -> Option<ChannelHandle> {
        let url = format!("{}/channels/{}", self.base_url, channel_id);
        match self.client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => {
                let channel = resp.json::<DiscordChannel>().await.ok();
                Some(ChannelHandle {
                    id: channel_id,
                    name: channel.and_then(|c| c.name),
                })
            }
            Ok(resp) => {
                warn!("Discord channel {} not found: HTTP {}", channel_id, resp.status());
                None
            }
            Err(e) => {
                warn!("Discord channel {} lookup failed: {}", channel_id, e);
                None
            }
        }
    }

    async fn send(&self, channel: &ChannelHandle, payload: &NotificationPayload) -> Result<()> {
        let url = format!("{}/channels/{}/messages", self.base_url, channel.id);
        let message = DiscordMessage {
            embeds: [DiscordEmbed::from(payload)],
        };

        let resp = self.client.post(&url).json(&message).send().await?;
        let status = resp.status();
        if status.is_success() {
            debug!("Discord notification sent to {}", channel.id);
            return Ok(());
        }

        let body = resp.text().await.unwrap_or_default();
        error!("Discord notification failed: {} - {}", status, truncate(&body));
        Err(GameWatchError::Send(format!("HTTP {}: {}", status, truncate(&body))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::STEAM_COLOR;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_embed_shape() {
        let payload = NotificationPayload::new("🎮 New Steam Purchase!", STEAM_COLOR)
            .description("**gaben** just bought **Portal 2** on Steam!")
            .inline_field("KDA", "1/2/3")
            .thumbnail("https://example.invalid/header.jpg")
            .footer("Steam Purchase Tracker")
            .timestamp(Utc.timestamp_opt(0, 0).unwrap());

        let message = DiscordMessage {
            embeds: [DiscordEmbed::from(&payload)],
        };
        let json = serde_json::to_value(&message).unwrap();
        let embed = &json["embeds"][0];

        assert_eq!(embed["title"], "🎮 New Steam Purchase!");
        assert_eq!(embed["color"], STEAM_COLOR);
        assert_eq!(embed["fields"][0]["name"], "KDA");
        assert_eq!(embed["fields"][0]["inline"], true);
        assert_eq!(embed["footer"]["text"], "Steam Purchase Tracker");
        assert_eq!(embed["thumbnail"]["url"], "https://example.invalid/header.jpg");
        assert_eq!(embed["timestamp"], "1970-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_embed_omits_empty_parts() {
        let payload = NotificationPayload::new("title", 1);
        let json = serde_json::to_value(DiscordEmbed::from(&payload)).unwrap();
        assert!(json.get("fields").is_none());
        assert!(json.get("footer").is_none());
        assert!(json.get("thumbnail").is_none());
    }
}
