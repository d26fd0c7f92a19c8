pub mod discord;
pub mod log_chat;
pub mod riot;
pub mod steam;

pub use discord::DiscordNotifier;
pub use log_chat::LogChat;
pub use riot::{RiotClient, DEFAULT_RIOT_REGION, RIOT_REGIONS};
pub use steam::SteamClient;

/// Clip an upstream error body for logs and error messages
pub(crate) fn truncate(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        return body.to_string();
    }
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
