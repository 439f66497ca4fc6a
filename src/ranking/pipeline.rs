//! Sequential, fault-isolated ranking pipeline
//!
//! Each stage receives the previous stage's output. A stage that fails (by
//! error or panic) is logged and passes its input through unchanged, so a
//! ranking call always yields exactly as many records as it was given.

use super::models::ActionRecord;
use super::strategy::{ScoringStrategy, StrategyError, StrategyKind};
use crate::metrics::METRICS;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Outcome of one pipeline stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StageStatus {
    Applied,
    Failed { error: String },
}

/// Per-stage trace returned alongside the ranked records
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageReport {
    pub strategy: String,
    pub field: String,
    #[serde(flatten)]
    pub status: StageStatus,
    pub elapsed_us: u64,
}

impl StageReport {
    pub fn is_applied(&self) -> bool {
        matches!(self.status, StageStatus::Applied)
    }
}

/// Ranked records plus the trace that produced them
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankOutcome {
    pub records: Vec<ActionRecord>,
    pub stages: Vec<StageReport>,
}

/// Ordered chain of scoring strategies
#[derive(Clone, Default)]
pub struct RankingPipeline {
    strategies: Vec<Arc<dyn ScoringStrategy>>,
    seed: Option<u64>,
}

impl RankingPipeline {
    pub fn new(strategies: Vec<Arc<dyn ScoringStrategy>>) -> Self {
        Self {
            strategies,
            seed: None,
        }
    }

    /// Build a pipeline from built-in strategy names
    pub fn from_kinds(kinds: &[StrategyKind], monte_carlo_samples: usize) -> Self {
        Self::new(
            kinds
                .iter()
                .map(|kind| kind.build(monte_carlo_samples))
                .collect(),
        )
    }

    /// Fix the random source so stochastic stages are reproducible
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_strategy(mut self, strategy: Arc<dyn ScoringStrategy>) -> Self {
        self.strategies.push(strategy);
        self
    }

    pub fn strategies(&self) -> &[Arc<dyn ScoringStrategy>] {
        &self.strategies
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Rank with a generator derived from the configured seed (or entropy)
    pub fn rank(&self, records: Vec<ActionRecord>) -> RankOutcome {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.rank_with_rng(records, &mut rng)
    }

    /// Rank with an injected random source
    pub fn rank_with_rng(&self, records: Vec<ActionRecord>, rng: &mut dyn RngCore) -> RankOutcome {
        let mut current = records;
        let mut stages = Vec::with_capacity(self.strategies.len());

        for strategy in &self.strategies {
            let start = Instant::now();
            let result = run_isolated(strategy.as_ref(), &current, rng);
            let elapsed = start.elapsed();

            let status = match result {
                Ok(next) => {
                    debug!(
                        strategy = strategy.name(),
                        records = next.len(),
                        "Ranking stage applied"
                    );
                    current = next;
                    StageStatus::Applied
                }
                Err(e) => {
                    warn!(
                        strategy = strategy.name(),
                        error = %e,
                        "Ranking stage failed, passing input through"
                    );
                    StageStatus::Failed {
                        error: e.to_string(),
                    }
                }
            };

            let applied = matches!(status, StageStatus::Applied);
            METRICS.record_ranking_stage(strategy.name(), applied, elapsed.as_secs_f64());

            stages.push(StageReport {
                strategy: strategy.name().to_string(),
                field: strategy.field().to_string(),
                status,
                elapsed_us: elapsed.as_micros() as u64,
            });
        }

        RankOutcome {
            records: current,
            stages,
        }
    }
}

/// Run a single stage, turning panics and length changes into failures
fn run_isolated(
    strategy: &dyn ScoringStrategy,
    records: &[ActionRecord],
    rng: &mut dyn RngCore,
) -> Result<Vec<ActionRecord>, StrategyError> {
    let output = panic::catch_unwind(AssertUnwindSafe(|| strategy.score_and_sort(records, rng)))
        .map_err(|payload| StrategyError::Panicked(panic_message(payload.as_ref())))??;

    if output.len() != records.len() {
        return Err(StrategyError::LengthMismatch {
            expected: records.len(),
            actual: output.len(),
        });
    }

    Ok(output)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Rank `records` through `strategies` in order using `rng`
pub fn rank(
    records: Vec<ActionRecord>,
    strategies: &[Arc<dyn ScoringStrategy>],
    rng: &mut dyn RngCore,
) -> Vec<ActionRecord> {
    RankingPipeline::new(strategies.to_vec())
        .rank_with_rng(records, rng)
        .records
}
