use thiserror::Error;

/// Main error type for the notifier
#[derive(Error, Debug)]
pub enum GameWatchError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Network errors
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Tracking errors
    #[error("Resolution failed: {0}")]
    Resolution(#[from] ResolutionFailure),

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    // Chat platform errors
    #[error("Destination unavailable: {0}")]
    DestinationUnavailable(String),

    #[error("Send failed: {0}")]
    Send(String),

    #[error("Chat platform not ready")]
    NotReady,

    // Validation errors
    #[error("Validation failed: {0}")]
    Validation(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for GameWatchError
pub type Result<T> = std::result::Result<T, GameWatchError>;

/// Non-success answer (or transport failure) from a read-only upstream API.
///
/// A failed fetch never mutates tracking state; the next scheduled tick is the retry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{endpoint} returned {}: {message}", status_label(.status))]
pub struct FetchFailure {
    pub endpoint: String,
    /// HTTP status, `None` when the request never got a response
    pub status: Option<u16>,
    pub message: String,
}

fn status_label(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!("HTTP {}", code),
        None => "no response".to_string(),
    }
}

impl FetchFailure {
    pub fn status(endpoint: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            status: Some(status),
            message: message.into(),
        }
    }

    pub fn transport(endpoint: impl Into<String>, err: &reqwest::Error) -> Self {
        Self {
            endpoint: endpoint.into(),
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }

    pub fn decode(endpoint: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self {
            endpoint: endpoint.into(),
            status: None,
            message: format!("undecodable response: {}", err),
        }
    }

    /// Server errors, throttling and transport failures are worth retrying.
    pub fn is_transient(&self) -> bool {
        match self.status {
            None => true,
            Some(429) => true,
            Some(code) => code >= 500,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status == Some(404)
    }
}

pub type FetchResult<T> = std::result::Result<T, FetchFailure>;

/// Why a tracked display name could not be bound to a stable id
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionFailure {
    #[error("'{display_name}' not found upstream")]
    NotFound { display_name: String },

    #[error("upstream unavailable while resolving '{display_name}': {reason}")]
    UpstreamUnavailable { display_name: String, reason: String },

    #[error("malformed identifier '{display_name}': {reason}")]
    Malformed { display_name: String, reason: String },
}

impl ResolutionFailure {
    pub fn display_name(&self) -> &str {
        match self {
            Self::NotFound { display_name }
            | Self::UpstreamUnavailable { display_name, .. }
            | Self::Malformed { display_name, .. } => display_name,
        }
    }
}
