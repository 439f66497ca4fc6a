//! Scoring strategy seam
//!
//! A strategy computes one named score per record and re-sorts the sequence
//! by it. Strategies are stateless; any randomness comes from the generator
//! handed in by the pipeline.

use super::models::ActionRecord;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// A scoring strategy could not compute its annotation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StrategyError {
    #[error("Malformed field `{field}` on record {index}: {reason}")]
    MalformedField {
        field: &'static str,
        index: usize,
        reason: String,
    },

    #[error("Strategy produced {actual} scores for {expected} records")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Strategy produced a non-finite score for record {index}")]
    NonFiniteScore { index: usize },

    #[error("Strategy panicked: {0}")]
    Panicked(String),

    #[error("{0}")]
    Other(String),
}

/// Polymorphic scoring capability
pub trait ScoringStrategy: Send + Sync {
    /// Human-readable strategy name, used in logs and stage reports
    fn name(&self) -> &str;

    /// Annotation field this strategy writes
    fn field(&self) -> &str;

    /// Compute one score per record, in input order
    fn scores(
        &self,
        records: &[ActionRecord],
        rng: &mut dyn RngCore,
    ) -> Result<Vec<f64>, StrategyError>;

    /// Annotate every record with its score and stable-sort descending
    fn score_and_sort(
        &self,
        records: &[ActionRecord],
        rng: &mut dyn RngCore,
    ) -> Result<Vec<ActionRecord>, StrategyError> {
        let scores = self.scores(records, rng)?;

        if scores.len() != records.len() {
            return Err(StrategyError::LengthMismatch {
                expected: records.len(),
                actual: scores.len(),
            });
        }
        if let Some(index) = scores.iter().position(|s| !s.is_finite()) {
            return Err(StrategyError::NonFiniteScore { index });
        }

        let mut scored: Vec<(ActionRecord, f64)> = records
            .iter()
            .cloned()
            .zip(scores)
            .map(|(mut record, score)| {
                record.annotate(self.field(), score);
                (record, score)
            })
            .collect();

        // Vec::sort_by is stable, so equal scores keep their input order
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        Ok(scored.into_iter().map(|(record, _)| record).collect())
    }
}

/// Built-in strategies addressable from configuration and requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    #[serde(alias = "multi_armed_bandit")]
    AggregateReward,
    #[serde(alias = "monte_carlo")]
    SampledReward,
    #[serde(alias = "policy_gradient")]
    SoftmaxPriority,
    #[serde(alias = "bayesian_inference")]
    PosteriorBlend,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::AggregateReward => "aggregate_reward",
            StrategyKind::SampledReward => "sampled_reward",
            StrategyKind::SoftmaxPriority => "softmax_priority",
            StrategyKind::PosteriorBlend => "posterior_blend",
        }
    }

    /// Instantiate the strategy
    pub fn build(&self, monte_carlo_samples: usize) -> Arc<dyn ScoringStrategy> {
        use super::strategies::*;

        match self {
            StrategyKind::AggregateReward => Arc::new(AggregateRewardStrategy),
            StrategyKind::SampledReward => Arc::new(SampledRewardStrategy::new(monte_carlo_samples)),
            StrategyKind::SoftmaxPriority => Arc::new(SoftmaxPriorityStrategy),
            StrategyKind::PosteriorBlend => Arc::new(PosteriorBlendStrategy::default()),
        }
    }

    /// Parse a comma-separated list such as `sampled_reward,posterior_blend`
    pub fn parse_list(value: &str) -> Result<Vec<StrategyKind>, String> {
        value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(StrategyKind::from_str)
            .collect()
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "aggregate_reward" | "multi_armed_bandit" => Ok(StrategyKind::AggregateReward),
            "sampled_reward" | "monte_carlo" => Ok(StrategyKind::SampledReward),
            "softmax_priority" | "policy_gradient" => Ok(StrategyKind::SoftmaxPriority),
            "posterior_blend" | "bayesian_inference" => Ok(StrategyKind::PosteriorBlend),
            other => Err(format!("Unknown strategy: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct ConstantStrategy(Vec<f64>);

    impl ScoringStrategy for ConstantStrategy {
        fn name(&self) -> &str {
            "constant"
        }

        fn field(&self) -> &str {
            "constant_score"
        }

        fn scores(
            &self,
            _records: &[ActionRecord],
            _rng: &mut dyn RngCore,
        ) -> Result<Vec<f64>, StrategyError> {
            Ok(self.0.clone())
        }
    }

    fn records(n: usize) -> Vec<ActionRecord> {
        (0..n)
            .map(|i| ActionRecord::new("U001", "X", format!("task_{}", i)))
            .collect()
    }

    #[test]
    fn test_default_sort_is_descending_and_stable() {
        let strategy = ConstantStrategy(vec![1.0, 3.0, 1.0, 2.0]);
        let mut rng = StdRng::seed_from_u64(7);

        let sorted = strategy.score_and_sort(&records(4), &mut rng).unwrap();
        let tasks: Vec<_> = sorted.iter().map(|r| r.task_type.as_str()).collect();
        assert_eq!(tasks, vec!["task_1", "task_3", "task_0", "task_2"]);
        assert!(sorted.iter().all(|r| r.annotation("constant_score").is_some()));
    }

    #[test]
    fn test_length_mismatch_is_a_failure() {
        let strategy = ConstantStrategy(vec![1.0]);
        let mut rng = StdRng::seed_from_u64(7);

        let err = strategy.score_and_sort(&records(2), &mut rng).unwrap_err();
        assert_eq!(err, StrategyError::LengthMismatch { expected: 2, actual: 1 });
    }

    #[test]
    fn test_non_finite_score_is_a_failure() {
        let strategy = ConstantStrategy(vec![1.0, f64::NAN]);
        let mut rng = StdRng::seed_from_u64(7);

        let err = strategy.score_and_sort(&records(2), &mut rng).unwrap_err();
        assert_eq!(err, StrategyError::NonFiniteScore { index: 1 });
    }

    #[test]
    fn test_parse_strategy_names_and_aliases() {
        let kinds = StrategyKind::parse_list("monte_carlo, softmax_priority,bayesian_inference").unwrap();
        assert_eq!(
            kinds,
            vec![
                StrategyKind::SampledReward,
                StrategyKind::SoftmaxPriority,
                StrategyKind::PosteriorBlend
            ]
        );
        assert!(StrategyKind::parse_list("genetic_algorithm").is_err());
    }

    #[test]
    fn test_kind_deserializes_from_alias() {
        let kind: StrategyKind = serde_json::from_str("\"multi_armed_bandit\"").unwrap();
        assert_eq!(kind, StrategyKind::AggregateReward);
        assert_eq!(serde_json::to_string(&kind).unwrap(), "\"aggregate_reward\"");
    }
}
