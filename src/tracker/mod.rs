//! Duplicate suppression: what has already been reported, and what is new.

pub mod formatter;
pub mod novelty;
pub mod purchase_memory;
pub mod watermark;

pub use formatter::{format_notification, steam_header_url};
pub use novelty::{
    FirstSightPolicy, MatchNovelty, PurchaseNovelty, Verdict, DEFAULT_PURCHASE_RECENCY_MINUTES,
};
pub use purchase_memory::PurchaseMemory;
pub use watermark::WatermarkStore;
