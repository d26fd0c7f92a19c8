pub mod control;
pub mod fetcher;
pub mod pipeline;
pub mod resolver;
pub mod scheduler;

pub use control::{router, ControlServer};
pub use fetcher::{LatestMatch, MatchFetcher, TitleFetcher};
pub use pipeline::{MatchPipeline, PollCategory, PurchasePipeline, TickReport, TickTrigger};
pub use resolver::{parse_riot_id, resolve_storefront_id, EntityResolver};
pub use scheduler::{CategorySnapshot, CategoryStats, PollScheduler, SchedulerSnapshot};
