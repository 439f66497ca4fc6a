//! Built-in scoring strategies

use super::models::ActionRecord;
use super::strategy::{ScoringStrategy, StrategyError};
use rand::distributions::{Distribution, Uniform};
use rand::RngCore;
use rand_distr::Beta;
use std::collections::HashMap;

/// Offset added to group counts before dividing
const COUNT_EPSILON: f64 = 1e-5;

/// Default number of draws per record for [`SampledRewardStrategy`]
pub const DEFAULT_MONTE_CARLO_SAMPLES: usize = 10;

fn finite_reward(record: &ActionRecord, index: usize) -> Result<f64, StrategyError> {
    let reward = record.effective_reward();
    if reward.is_finite() {
        Ok(reward)
    } else {
        Err(StrategyError::MalformedField {
            field: "reward",
            index,
            reason: format!("expected a finite number, got {}", reward),
        })
    }
}

/// Mean reward per agent, shared by every record of that agent
#[derive(Debug, Clone, Copy, Default)]
pub struct AggregateRewardStrategy;

impl ScoringStrategy for AggregateRewardStrategy {
    fn name(&self) -> &str {
        "aggregate_reward"
    }

    fn field(&self) -> &str {
        "agent_score"
    }

    fn scores(
        &self,
        records: &[ActionRecord],
        _rng: &mut dyn RngCore,
    ) -> Result<Vec<f64>, StrategyError> {
        let mut totals: HashMap<&str, (f64, usize)> = HashMap::new();

        for (index, record) in records.iter().enumerate() {
            let reward = finite_reward(record, index)?;
            let entry = totals.entry(record.agent_used.as_str()).or_insert((0.0, 0));
            entry.0 += reward;
            entry.1 += 1;
        }

        Ok(records
            .iter()
            .map(|record| {
                let (sum, count) = totals[record.agent_used.as_str()];
                sum / (count as f64 + COUNT_EPSILON)
            })
            .collect())
    }
}

/// Monte Carlo estimate of reward under ±20% uniform noise
#[derive(Debug, Clone, Copy)]
pub struct SampledRewardStrategy {
    samples: usize,
}

impl SampledRewardStrategy {
    pub fn new(samples: usize) -> Self {
        Self { samples }
    }

    pub fn samples(&self) -> usize {
        self.samples
    }
}

impl Default for SampledRewardStrategy {
    fn default() -> Self {
        Self::new(DEFAULT_MONTE_CARLO_SAMPLES)
    }
}

impl ScoringStrategy for SampledRewardStrategy {
    fn name(&self) -> &str {
        "sampled_reward"
    }

    fn field(&self) -> &str {
        "monte_carlo_reward"
    }

    fn scores(
        &self,
        records: &[ActionRecord],
        rng: &mut dyn RngCore,
    ) -> Result<Vec<f64>, StrategyError> {
        if self.samples == 0 {
            return Err(StrategyError::Other(
                "sample count must be at least 1".to_string(),
            ));
        }

        let noise = Uniform::new_inclusive(0.8, 1.2);

        records
            .iter()
            .enumerate()
            .map(|(index, record)| {
                let reward = finite_reward(record, index)?;
                let total: f64 = (0..self.samples).map(|_| noise.sample(rng) * reward).sum();
                Ok(total / self.samples as f64)
            })
            .collect()
    }
}

/// Softmax over priority weights, normalized across the whole set
#[derive(Debug, Clone, Copy, Default)]
pub struct SoftmaxPriorityStrategy;

impl ScoringStrategy for SoftmaxPriorityStrategy {
    fn name(&self) -> &str {
        "softmax_priority"
    }

    fn field(&self) -> &str {
        "policy_prob"
    }

    fn scores(
        &self,
        records: &[ActionRecord],
        _rng: &mut dyn RngCore,
    ) -> Result<Vec<f64>, StrategyError> {
        let exps: Vec<f64> = records
            .iter()
            .map(|r| r.effective_priority().weight().exp())
            .collect();

        let sum: f64 = exps.iter().sum();
        let norm = if sum > 0.0 { sum } else { 1.0 };

        Ok(exps.into_iter().map(|e| e / norm).collect())
    }
}

/// Two-outcome Bayes update of a Beta-distributed prior by reward/10
#[derive(Debug, Clone, Copy)]
pub struct PosteriorBlendStrategy {
    alpha: f64,
    beta: f64,
}

impl PosteriorBlendStrategy {
    pub fn new(alpha: f64, beta: f64) -> Self {
        Self { alpha, beta }
    }
}

impl Default for PosteriorBlendStrategy {
    fn default() -> Self {
        Self::new(2.0, 5.0)
    }
}

impl ScoringStrategy for PosteriorBlendStrategy {
    fn name(&self) -> &str {
        "posterior_blend"
    }

    fn field(&self) -> &str {
        "bayesian_score"
    }

    fn scores(
        &self,
        records: &[ActionRecord],
        rng: &mut dyn RngCore,
    ) -> Result<Vec<f64>, StrategyError> {
        let prior_dist = Beta::new(self.alpha, self.beta)
            .map_err(|e| StrategyError::Other(format!("invalid prior: {}", e)))?;

        records
            .iter()
            .enumerate()
            .map(|(index, record)| {
                let prior = prior_dist.sample(rng);
                let likelihood = finite_reward(record, index)? / 10.0;

                let evidence = prior * likelihood + (1.0 - prior) * (1.0 - likelihood);
                if evidence == 0.0 || !evidence.is_finite() {
                    return Err(StrategyError::MalformedField {
                        field: "reward",
                        index,
                        reason: format!("reward {} leaves no evidence mass", likelihood * 10.0),
                    });
                }

                Ok(prior * likelihood / evidence)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranking::models::PriorityLevel;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn test_aggregate_reward_groups_by_agent() {
        let records = vec![
            ActionRecord::new("U1", "X", "a").with_reward(2.0),
            ActionRecord::new("U1", "Y", "b").with_reward(1.0),
            ActionRecord::new("U1", "X", "c").with_reward(4.0),
        ];

        let sorted = AggregateRewardStrategy
            .score_and_sort(&records, &mut rng())
            .unwrap();

        let tasks: Vec<_> = sorted.iter().map(|r| r.task_type.as_str()).collect();
        assert_eq!(tasks, vec!["a", "c", "b"]);
        assert!((sorted[0].annotation("agent_score").unwrap() - 3.0).abs() < 1e-4);
        assert!((sorted[2].annotation("agent_score").unwrap() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_aggregate_reward_rejects_nan_reward() {
        let records = vec![ActionRecord::new("U1", "X", "a").with_reward(f64::NAN)];
        let err = AggregateRewardStrategy
            .score_and_sort(&records, &mut rng())
            .unwrap_err();
        assert!(matches!(err, StrategyError::MalformedField { field: "reward", index: 0, .. }));
    }

    #[test]
    fn test_sampled_reward_stays_within_noise_band() {
        let records = vec![
            ActionRecord::new("U1", "X", "a").with_reward(5.0),
            ActionRecord::new("U1", "X", "b"),
        ];

        let sorted = SampledRewardStrategy::new(200)
            .score_and_sort(&records, &mut rng())
            .unwrap();

        let top = sorted[0].annotation("monte_carlo_reward").unwrap();
        let bottom = sorted[1].annotation("monte_carlo_reward").unwrap();
        assert_eq!(sorted[0].task_type, "a");
        assert!((4.0..=6.0).contains(&top));
        assert!((0.8..=1.2).contains(&bottom));
    }

    #[test]
    fn test_sampled_reward_requires_samples() {
        let records = vec![ActionRecord::new("U1", "X", "a")];
        let err = SampledRewardStrategy::new(0)
            .score_and_sort(&records, &mut rng())
            .unwrap_err();
        assert!(matches!(err, StrategyError::Other(_)));
    }

    #[test]
    fn test_softmax_prefers_high_priority() {
        let records = vec![
            ActionRecord::new("U1", "X", "low").with_priority(PriorityLevel::Low),
            ActionRecord::new("U1", "X", "missing"),
            ActionRecord::new("U1", "X", "high").with_priority(PriorityLevel::High),
        ];

        let sorted = SoftmaxPriorityStrategy
            .score_and_sort(&records, &mut rng())
            .unwrap();

        let tasks: Vec<_> = sorted.iter().map(|r| r.task_type.as_str()).collect();
        assert_eq!(tasks, vec!["high", "missing", "low"]);

        let expected_medium = 2f64.exp() / (1f64.exp() + 2f64.exp() + 3f64.exp());
        assert!((sorted[1].annotation("policy_prob").unwrap() - expected_medium).abs() < 1e-12);
    }

    #[test]
    fn test_posterior_blend_is_a_probability() {
        let records: Vec<_> = (0..20)
            .map(|i| ActionRecord::new("U1", "X", format!("t{}", i)).with_reward(i as f64 / 4.0))
            .collect();

        let sorted = PosteriorBlendStrategy::default()
            .score_and_sort(&records, &mut rng())
            .unwrap();

        for record in &sorted {
            let score = record.annotation("bayesian_score").unwrap();
            assert!((0.0..=1.0).contains(&score), "score out of range: {}", score);
        }
    }

    #[test]
    fn test_posterior_blend_zero_reward_scores_zero() {
        let records = vec![ActionRecord::new("U1", "X", "a").with_reward(0.0)];
        let sorted = PosteriorBlendStrategy::default()
            .score_and_sort(&records, &mut rng())
            .unwrap();
        assert_eq!(sorted[0].annotation("bayesian_score"), Some(0.0));
    }

    #[test]
    fn test_empty_input_is_empty_output() {
        let mut rng = rng();
        assert!(AggregateRewardStrategy.score_and_sort(&[], &mut rng).unwrap().is_empty());
        assert!(SampledRewardStrategy::default().score_and_sort(&[], &mut rng).unwrap().is_empty());
        assert!(SoftmaxPriorityStrategy.score_and_sort(&[], &mut rng).unwrap().is_empty());
        assert!(PosteriorBlendStrategy::default().score_and_sort(&[], &mut rng).unwrap().is_empty());
    }
}
