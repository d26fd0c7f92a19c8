pub mod adapters;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod services;
pub mod tracker;

pub use config::AppConfig;
pub use domain::{Category, Ecosystem, MatchGame, TrackedEntity};
pub use error::{GameWatchError, Result};
pub use services::{PollScheduler, TickReport, TickTrigger};
