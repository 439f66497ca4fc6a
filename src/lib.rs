//! Action suggestion service
//!
//! Ranks a user's logged agent interactions through a chain of scoring
//! strategies and turns the recent history into next-action suggestions.

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod ranking;
pub mod records;
pub mod suggestions;

pub use config::Config;
pub use error::{Error, Result};
pub use ranking::{ActionRecord, RankingPipeline, StrategyKind};
