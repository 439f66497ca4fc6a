//! Synthetic action history for local runs and demos
//!
//! Users lean toward a preferred agent and a typical priority, tasks cluster
//! in working hours, and feedback tracks the completion status.

use crate::ranking::{ActionRecord, CompletionStatus, PriorityLevel};
use chrono::{Duration, TimeZone, Utc};
use rand::distributions::WeightedIndex;
use rand::prelude::*;

pub const AGENTS: [&str; 3] = ["Executive Assistant", "Task Management", "Calendar Agent"];

const USER_COUNT: u32 = 50;
const PREFERRED_AGENT_BIAS: f64 = 0.8;

fn tasks_for(agent: &str) -> &'static [&'static str] {
    match agent {
        "Executive Assistant" => &["Schedule Meeting", "Send Email", "Generate Summary"],
        "Task Management" => &["Assign Task", "Track Progress", "Send Reminder"],
        _ => &["Update Event", "Resolve Conflict", "Send Confirmation"],
    }
}

struct UserProfile {
    preferred_agent: &'static str,
    typical_priority: PriorityLevel,
}

/// Format a user id the way stored histories do (`U001`)
pub fn user_id(n: u32) -> String {
    format!("U{:03}", n)
}

/// Generate `count` records deterministically from `seed`
pub fn generate(count: usize, seed: u64) -> Vec<ActionRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    let priorities = [PriorityLevel::Low, PriorityLevel::Medium, PriorityLevel::High];

    let profiles: Vec<UserProfile> = (0..USER_COUNT)
        .map(|_| UserProfile {
            preferred_agent: AGENTS[rng.gen_range(0..AGENTS.len())],
            typical_priority: priorities[rng.gen_range(0..priorities.len())],
        })
        .collect();

    // 6 night hours, 8 work hours, 4 afternoon hours, 6 evening hours
    let hour_weights: Vec<u32> = [1u32; 6]
        .into_iter()
        .chain([4; 8])
        .chain([3; 4])
        .chain([2; 6])
        .collect();
    let hour_dist = WeightedIndex::new(&hour_weights).expect("static weights are valid");
    let statuses = [
        CompletionStatus::Completed,
        CompletionStatus::InProgress,
        CompletionStatus::Failed,
    ];
    let start = Utc
        .with_ymd_and_hms(2025, 2, 1, 8, 0, 0)
        .single()
        .expect("static start time is valid");

    (0..count)
        .map(|i| {
            let user_n = rng.gen_range(1..=USER_COUNT);
            let profile = &profiles[(user_n - 1) as usize];

            let agent = if rng.gen_bool(PREFERRED_AGENT_BIAS) {
                profile.preferred_agent
            } else {
                AGENTS[rng.gen_range(0..AGENTS.len())]
            };
            let tasks = tasks_for(agent);
            let task = tasks[rng.gen_range(0..tasks.len())];

            let hour = hour_dist.sample(&mut rng) as i64;
            let timestamp = start
                + Duration::days(rng.gen_range(0..=30))
                + Duration::hours(hour)
                + Duration::minutes(rng.gen_range(0..=59));

            let priority = profile.typical_priority;
            let long_task = task.contains("Meeting") || task.contains("Summary");
            let duration_secs: u32 = if long_task {
                rng.gen_range(300..=600)
            } else {
                rng.gen_range(60..=300)
            };

            let status_weights = if duration_secs > 400 && priority == PriorityLevel::High {
                [0.7, 0.2, 0.1]
            } else {
                [0.6, 0.3, 0.1]
            };
            let status_dist = WeightedIndex::new(status_weights).expect("static weights are valid");
            let status = statuses[status_dist.sample(&mut rng)];

            let (lo, hi) = match status {
                CompletionStatus::Completed => (4.0, 5.0),
                CompletionStatus::InProgress => (3.5, 4.5),
                CompletionStatus::Failed => (3.0, 4.0),
            };
            let feedback = (rng.gen_range(lo..=hi) * 10.0_f64).round() / 10.0;

            ActionRecord::new(user_id(user_n), agent, task)
                .with_session(format!("S{}", 100 + i))
                .with_timestamp(timestamp)
                .with_status(status)
                .with_priority(priority)
                .with_feedback(feedback)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_is_deterministic() {
        let a = generate(50, 7);
        let b = generate(50, 7);
        assert_eq!(a, b);
        assert_ne!(a, generate(50, 8));
    }

    #[test]
    fn test_generated_fields_are_in_range() {
        for record in generate(300, 1) {
            assert!(AGENTS.contains(&record.agent_used.as_str()));
            assert!(tasks_for(&record.agent_used).contains(&record.task_type.as_str()));
            assert!((3.0..=5.0).contains(&record.feedback_score));
            assert!(record.user_id.starts_with('U') && record.user_id.len() == 4);
            assert!(record.session_id.starts_with('S'));
            assert!(record.reward.is_none());
        }
    }

    #[test]
    fn test_feedback_tracks_status() {
        for record in generate(300, 3) {
            match record.completion_status {
                CompletionStatus::Completed => assert!(record.feedback_score >= 4.0),
                CompletionStatus::Failed => assert!(record.feedback_score <= 4.0),
                CompletionStatus::InProgress => {
                    assert!((3.5..=4.5).contains(&record.feedback_score))
                }
            }
        }
    }
}
