//! Usage patterns derived from a user's raw action history

use crate::ranking::{ActionRecord, PriorityLevel};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::hash::Hash;

/// Summary statistics over a user's history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPatterns {
    pub most_used_agent: String,
    pub average_feedback: f64,
    pub common_priority: PriorityLevel,
}

impl UserPatterns {
    /// `None` for an empty history
    pub fn from_history(history: &[ActionRecord]) -> Option<Self> {
        if history.is_empty() {
            return None;
        }

        let most_used_agent = most_frequent(history.iter().map(|r| r.agent_used.clone()))?;
        let common_priority = most_frequent(history.iter().map(|r| r.effective_priority()))?;
        let average_feedback =
            history.iter().map(|r| r.feedback_score).sum::<f64>() / history.len() as f64;

        Some(Self {
            most_used_agent,
            average_feedback,
            common_priority,
        })
    }
}

/// Highest count wins; ties go to the value seen first
fn most_frequent<T: Eq + Hash + Clone>(values: impl Iterator<Item = T>) -> Option<T> {
    let mut counts: IndexMap<T, usize> = IndexMap::new();
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
    }

    let mut best: Option<(&T, usize)> = None;
    for (value, &count) in &counts {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value.clone())
}

/// Render a history as a bullet list for the text generator
pub fn format_history(history: &[ActionRecord]) -> String {
    let mut out = String::from("User Action History:\n");
    for action in history {
        let _ = writeln!(out, "- Timestamp: {}", action.timestamp.to_rfc3339());
        let _ = writeln!(out, "  Agent: {}", action.agent_used);
        let _ = writeln!(out, "  Task: {}", action.task_type);
        let _ = writeln!(out, "  Status: {}", action.completion_status.as_str());
        let _ = writeln!(out, "  Priority: {}", action.effective_priority().as_str());
        let _ = writeln!(out, "  Feedback: {:.1}", action.feedback_score);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patterns_over_history() {
        let history = vec![
            ActionRecord::new("U1", "Calendar Agent", "Update Event")
                .with_priority(PriorityLevel::High)
                .with_feedback(4.0),
            ActionRecord::new("U1", "Task Management", "Assign Task")
                .with_priority(PriorityLevel::Low)
                .with_feedback(3.0),
            ActionRecord::new("U1", "Task Management", "Send Reminder")
                .with_priority(PriorityLevel::High)
                .with_feedback(5.0),
        ];

        let patterns = UserPatterns::from_history(&history).unwrap();
        assert_eq!(patterns.most_used_agent, "Task Management");
        assert_eq!(patterns.common_priority, PriorityLevel::High);
        assert!((patterns.average_feedback - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_tie_goes_to_first_seen() {
        let history = vec![
            ActionRecord::new("U1", "B", "t"),
            ActionRecord::new("U1", "A", "t"),
        ];
        let patterns = UserPatterns::from_history(&history).unwrap();
        assert_eq!(patterns.most_used_agent, "B");
        assert_eq!(patterns.common_priority, PriorityLevel::Medium);
    }

    #[test]
    fn test_empty_history_has_no_patterns() {
        assert!(UserPatterns::from_history(&[]).is_none());
    }

    #[test]
    fn test_format_history_lists_each_action() {
        let history = vec![
            ActionRecord::new("U1", "Calendar Agent", "Update Event").with_feedback(4.5),
            ActionRecord::new("U1", "Task Management", "Assign Task"),
        ];
        let text = format_history(&history);
        assert_eq!(text.matches("- Timestamp:").count(), 2);
        assert!(text.contains("Agent: Calendar Agent"));
        assert!(text.contains("Status: In Progress"));
        assert!(text.contains("Feedback: 4.5"));
    }
}
