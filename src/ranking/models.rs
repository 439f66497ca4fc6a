//! Data models for ranked user actions

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Reward assumed for records that never received one
pub const DEFAULT_REWARD: f64 = 1.0;

/// Outcome of a logged interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CompletionStatus {
    Completed,
    #[default]
    #[serde(rename = "In Progress", alias = "InProgress")]
    InProgress,
    Failed,
}

impl CompletionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionStatus::Completed => "Completed",
            CompletionStatus::InProgress => "In Progress",
            CompletionStatus::Failed => "Failed",
        }
    }
}

/// Priority attached to a logged interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum PriorityLevel {
    Low = 1,
    #[default]
    Medium = 2,
    High = 3,
}

impl PriorityLevel {
    /// Numeric weight used by priority-based scoring
    pub fn weight(&self) -> f64 {
        *self as i32 as f64
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PriorityLevel::Low => "Low",
            PriorityLevel::Medium => "Medium",
            PriorityLevel::High => "High",
        }
    }
}

/// One logged user interaction with the platform
///
/// Core fields are never rewritten by scoring. Strategies only touch the
/// annotation map, which keeps insertion order so responses list scores in
/// the order the stages ran.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub user_id: String,
    #[serde(default)]
    pub session_id: String,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    pub agent_used: String,
    #[serde(default)]
    pub task_type: String,
    #[serde(default)]
    pub completion_status: CompletionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority_level: Option<PriorityLevel>,
    #[serde(default)]
    pub feedback_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward: Option<f64>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    annotations: IndexMap<String, f64>,
}

impl ActionRecord {
    pub fn new(
        user_id: impl Into<String>,
        agent_used: impl Into<String>,
        task_type: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            session_id: String::new(),
            timestamp: Utc::now(),
            agent_used: agent_used.into(),
            task_type: task_type.into(),
            completion_status: CompletionStatus::default(),
            priority_level: None,
            feedback_score: 0.0,
            reward: None,
            annotations: IndexMap::new(),
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_status(mut self, status: CompletionStatus) -> Self {
        self.completion_status = status;
        self
    }

    pub fn with_priority(mut self, priority: PriorityLevel) -> Self {
        self.priority_level = Some(priority);
        self
    }

    pub fn with_feedback(mut self, feedback_score: f64) -> Self {
        self.feedback_score = feedback_score;
        self
    }

    pub fn with_reward(mut self, reward: f64) -> Self {
        self.reward = Some(reward);
        self
    }

    /// Reward, falling back to [`DEFAULT_REWARD`]
    pub fn effective_reward(&self) -> f64 {
        self.reward.unwrap_or(DEFAULT_REWARD)
    }

    /// Priority, falling back to `Medium`
    pub fn effective_priority(&self) -> PriorityLevel {
        self.priority_level.unwrap_or_default()
    }

    /// Attach or overwrite a named score
    pub fn annotate(&mut self, field: impl Into<String>, value: f64) {
        self.annotations.insert(field.into(), value);
    }

    pub fn annotation(&self, field: &str) -> Option<f64> {
        self.annotations.get(field).copied()
    }

    pub fn annotations(&self) -> &IndexMap<String, f64> {
        &self.annotations
    }

    /// Drop request-scoped scores before a record is stored
    pub fn without_annotations(mut self) -> Self {
        self.annotations.clear();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_for_missing_fields() {
        let record = ActionRecord::new("U001", "Calendar Agent", "Update Event");
        assert_eq!(record.effective_reward(), 1.0);
        assert_eq!(record.effective_priority(), PriorityLevel::Medium);
        assert!(record.annotations().is_empty());
    }

    #[test]
    fn test_priority_weights() {
        assert_eq!(PriorityLevel::Low.weight(), 1.0);
        assert_eq!(PriorityLevel::Medium.weight(), 2.0);
        assert_eq!(PriorityLevel::High.weight(), 3.0);
        assert_eq!(PriorityLevel::default(), PriorityLevel::Medium);
    }

    #[test]
    fn test_annotations_keep_insertion_order() {
        let mut record = ActionRecord::new("U001", "X", "T");
        record.annotate("b_score", 2.0);
        record.annotate("a_score", 1.0);
        record.annotate("b_score", 3.0);

        let keys: Vec<_> = record.annotations().keys().cloned().collect();
        assert_eq!(keys, vec!["b_score", "a_score"]);
        assert_eq!(record.annotation("b_score"), Some(3.0));
    }

    #[test]
    fn test_deserialize_stored_document() {
        let json = r#"{
            "user_id": "U024",
            "session_id": "S117",
            "timestamp": "2025-02-03T10:15:00Z",
            "agent_used": "Task Management",
            "task_type": "Assign Task",
            "completion_status": "In Progress",
            "priority_level": "High",
            "feedback_score": 4.2
        }"#;

        let record: ActionRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.completion_status, CompletionStatus::InProgress);
        assert_eq!(record.priority_level, Some(PriorityLevel::High));
        assert_eq!(record.reward, None);
        assert_eq!(record.effective_reward(), 1.0);
    }

    #[test]
    fn test_serialize_skips_empty_annotations() {
        let record = ActionRecord::new("U001", "X", "T");
        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("annotations").is_none());
        assert!(value.get("reward").is_none());
    }
}
