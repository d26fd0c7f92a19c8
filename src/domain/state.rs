use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-category poll state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TickPhase {
    /// Waiting for the next tick
    Idle,
    /// Querying the upstream for an entity's latest item
    Fetching,
    /// Deciding whether the fetched item is new
    Filtering,
    /// Rendering and sending an admitted item
    Notifying,
}

impl TickPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            TickPhase::Idle => "IDLE",
            TickPhase::Fetching => "FETCHING",
            TickPhase::Filtering => "FILTERING",
            TickPhase::Notifying => "NOTIFYING",
        }
    }

    /// Check if this phase can transition to another phase.
    ///
    /// Every entity of a tick walks Fetching -> Filtering -> Notifying, and may
    /// drop straight to the next entity (Fetching) or to Idle at any step.
    pub fn can_transition_to(&self, target: TickPhase) -> bool {
        use TickPhase::*;

        match (self, target) {
            (Idle, Fetching) => true,
            (Idle, Idle) => true,

            (Fetching, Filtering) => true,
            (Fetching, Fetching) => true,
            (Fetching, Idle) => true,

            (Filtering, Notifying) => true,
            (Filtering, Fetching) => true,
            (Filtering, Idle) => true,

            (Notifying, Fetching) => true,
            (Notifying, Idle) => true,

            _ => false,
        }
    }

    pub fn is_busy(&self) -> bool {
        !matches!(self, TickPhase::Idle)
    }
}

impl fmt::Display for TickPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
