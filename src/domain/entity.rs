use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Upstream API family that owns a stable identifier namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ecosystem {
    /// Riot account shared by every match game
    MatchGame,
    /// Steam account
    Storefront,
}

impl Ecosystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            Ecosystem::MatchGame => "match_game",
            Ecosystem::Storefront => "storefront",
        }
    }
}

impl fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Match-based game polled for a player's latest completed match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchGame {
    League,
    Valorant,
}

impl MatchGame {
    pub const ALL: [MatchGame; 2] = [MatchGame::League, MatchGame::Valorant];

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchGame::League => "lol",
            MatchGame::Valorant => "val",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            MatchGame::League => "LoL",
            MatchGame::Valorant => "Valorant",
        }
    }
}

impl fmt::Display for MatchGame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Independently scheduled unit of polling, each with its own destination channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Match(MatchGame),
    Storefront,
}

impl Category {
    pub const ALL: [Category; 3] = [
        Category::Match(MatchGame::League),
        Category::Match(MatchGame::Valorant),
        Category::Storefront,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Match(game) => game.as_str(),
            Category::Storefront => "steam",
        }
    }

    /// Does a manual-trigger filter select this category? `None` selects everything.
    pub fn matches_filter(&self, filter: Option<Category>) -> bool {
        filter.map_or(true, |wanted| wanted == *self)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for Category {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "lol" | "league" => Ok(Category::Match(MatchGame::League)),
            "val" | "valorant" => Ok(Category::Match(MatchGame::Valorant)),
            "steam" => Ok(Category::Storefront),
            other => Err(format!(
                "unknown category '{}'; expected lol|val|steam",
                other
            )),
        }
    }
}

/// A player bound to the stable id an upstream API knows them by.
///
/// Built once at startup by the resolver and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedEntity {
    pub display_name: String,
    pub stable_id: String,
    pub ecosystem: Ecosystem,
}

impl TrackedEntity {
    pub fn new(
        display_name: impl Into<String>,
        stable_id: impl Into<String>,
        ecosystem: Ecosystem,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            stable_id: stable_id.into(),
            ecosystem,
        }
    }

    /// Copy carrying a display name looked up for a single notification
    pub fn with_display_name(&self, display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            ..self.clone()
        }
    }
}
