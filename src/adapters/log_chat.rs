//! Chat sink that logs notifications instead of sending them (dry runs).

use async_trait::async_trait;
use std::sync::Mutex;
use tracing::info;

use crate::domain::{ChannelHandle, NotificationPayload};
use crate::error::{GameWatchError, Result};
use crate::ports::ChatPlatform;

#[derive(Default)]
pub struct LogChat {
    sent: Mutex<Vec<(u64, NotificationPayload)>>,
}

impl LogChat {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything "sent" so far, in order
    pub fn sent(&self) -> Vec<(u64, NotificationPayload)> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ChatPlatform for LogChat {
    async fn is_ready(&self) -> bool {
        true
    }

    async fn resolve_destination(&self, channel_id: u64) -> Option<ChannelHandle> {
        Some(ChannelHandle {
            id: channel_id,
            name: Some("dry-run".to_string()),
        })
    }

    async fn send(&self, channel: &ChannelHandle, payload: &NotificationPayload) -> Result<()> {
        let rendered = serde_json::to_string(payload)?;
        info!(channel = channel.id, "[DRY RUN] notification: {}", rendered);
        self.sent
            .lock()
            .map_err(|_| GameWatchError::Internal("dry-run sink poisoned".to_string()))?
            .push((channel.id, payload.clone()));
        Ok(())
    }
}
