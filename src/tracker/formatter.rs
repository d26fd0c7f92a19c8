use chrono::{DateTime, Local, TimeZone, Utc};
use serde_json::Value;

use crate::domain::{
    Category, FetchedItem, ItemPayload, MatchGame, NotificationPayload, TrackedEntity,
    LEAGUE_COLOR, STEAM_COLOR, VALORANT_COLOR,
};
use crate::error::{GameWatchError, Result};

const STEAM_FOOTER: &str = "Steam Purchase Tracker";

pub fn steam_header_url(app_id: u64) -> String {
    format!(
        "https://steamcdn-a.akamaihd.net/steam/apps/{}/header.jpg",
        app_id
    )
}

/// Render an admitted item for the chat channel.
///
/// Pure: `now` stamps storefront notifications. Fails with
/// `MalformedPayload` when the match detail has no record for the entity.
pub fn format_notification(
    entity: &TrackedEntity,
    item: &FetchedItem,
    category: Category,
    now: DateTime<Utc>,
) -> Result<NotificationPayload> {
    match (&item.payload, category) {
        (ItemPayload::Match { detail }, Category::Match(MatchGame::League)) => {
            format_league(entity, &item.id, detail)
        }
        (ItemPayload::Match { detail }, Category::Match(MatchGame::Valorant)) => {
            format_valorant(entity, &item.id, detail)
        }
        (ItemPayload::Title { app_id, name }, Category::Storefront) => {
            Ok(format_purchase(entity, *app_id, name, now))
        }
        _ => Err(GameWatchError::MalformedPayload(format!(
            "item {} does not belong to category {}",
            item.id, category
        ))),
    }
}

fn format_league(entity: &TrackedEntity, match_id: &str, detail: &Value) -> Result<NotificationPayload> {
    let info = &detail["info"];
    let player = find_participant(&info["participants"], &entity.stable_id).ok_or_else(|| {
        missing_participant(entity, match_id)
    })?;

    let result = if player["win"].as_bool().unwrap_or(false) {
        "Victory"
    } else {
        "Defeat"
    };

    Ok(NotificationPayload::new(
        format!(
            "{}'s Recent {} Game",
            entity.display_name,
            MatchGame::League.title()
        ),
        LEAGUE_COLOR,
    )
    .inline_field("Champion", text(&player["championName"]))
    .inline_field("KDA", kda(player))
    .inline_field("Result", result)
    .footer(format!(
        "{} | {}",
        text(&info["gameMode"]),
        short_time(&info["gameCreation"])
    )))
}

fn format_valorant(entity: &TrackedEntity, match_id: &str, detail: &Value) -> Result<NotificationPayload> {
    let player = find_participant(&detail["players"], &entity.stable_id).ok_or_else(|| {
        missing_participant(entity, match_id)
    })?;
    let metadata = &detail["metadata"];

    Ok(NotificationPayload::new(
        format!(
            "{}'s Recent {} Game",
            entity.display_name,
            MatchGame::Valorant.title()
        ),
        VALORANT_COLOR,
    )
    .inline_field("Agent", text(&player["character"]))
    .inline_field("KDA", kda(&player["stats"]))
    .footer(format!(
        "{} | {}",
        text(&metadata["mode"]),
        short_time(&metadata["game_start"])
    )))
}

fn format_purchase(
    entity: &TrackedEntity,
    app_id: u64,
    game_name: &str,
    now: DateTime<Utc>,
) -> NotificationPayload {
    NotificationPayload::new("🎮 New Steam Purchase!", STEAM_COLOR)
        .description(format!(
            "**{}** just bought **{}** on Steam!",
            entity.display_name, game_name
        ))
        .thumbnail(steam_header_url(app_id))
        .footer(STEAM_FOOTER)
        .timestamp(now)
}

fn find_participant<'a>(participants: &'a Value, puuid: &str) -> Option<&'a Value> {
    participants
        .as_array()?
        .iter()
        .find(|p| p["puuid"].as_str() == Some(puuid))
}

fn missing_participant(entity: &TrackedEntity, match_id: &str) -> GameWatchError {
    GameWatchError::MalformedPayload(format!(
        "match {} has no participant record for {} ({})",
        match_id, entity.display_name, entity.stable_id
    ))
}

fn kda(stats: &Value) -> String {
    format!(
        "{}/{}/{}",
        number(&stats["kills"]),
        number(&stats["deaths"]),
        number(&stats["assists"])
    )
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "Unknown".to_string(),
        other => other.to_string(),
    }
}

fn number(value: &Value) -> i64 {
    value.as_i64().unwrap_or(0)
}

/// Epoch milliseconds as "MM/DD HH:MM" in the host's local time
fn short_time(value: &Value) -> String {
    value
        .as_i64()
        .and_then(|ms| Local.timestamp_millis_opt(ms).single())
        .map(|t| t.format("%m/%d %H:%M").to_string())
        .unwrap_or_else(|| "--/-- --:--".to_string())
}
