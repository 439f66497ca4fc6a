//! Action ranking pipeline
//!
//! Composes independent scoring strategies over a user's action records:
//! - Aggregate reward per agent (`agent_score`)
//! - Monte Carlo sampled reward (`monte_carlo_reward`)
//! - Softmax over priority (`policy_prob`)
//! - Beta-prior posterior blend (`bayesian_score`)
//!
//! Strategies run in caller order; annotations accumulate while only the
//! last successful stage decides the final order.

pub mod models;
pub mod pipeline;
pub mod strategies;
pub mod strategy;

pub use models::{ActionRecord, CompletionStatus, PriorityLevel, DEFAULT_REWARD};
pub use pipeline::{rank, RankOutcome, RankingPipeline, StageReport, StageStatus};
pub use strategies::{
    AggregateRewardStrategy, PosteriorBlendStrategy, SampledRewardStrategy,
    SoftmaxPriorityStrategy, DEFAULT_MONTE_CARLO_SAMPLES,
};
pub use strategy::{ScoringStrategy, StrategyError, StrategyKind};
