//! Request and response types for the HTTP API

use crate::ranking::{ActionRecord, StageReport, StrategyKind};
use crate::records::UserPatterns;
use crate::suggestions::SuggestionSource;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Machine-readable error codes
pub mod error_codes {
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const UPSTREAM_ERROR: &str = "UPSTREAM_ERROR";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

/// API error body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Query string for the suggestion endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SuggestionQuery {
    /// Comma-separated strategy names overriding the configured chain
    #[serde(default)]
    pub strategies: Option<String>,
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionResponse {
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
    pub recent_actions_analyzed: usize,
    pub suggestions: String,
    pub suggestion_source: SuggestionSource,
    pub user_patterns: Option<UserPatterns>,
    pub ranked_actions: Vec<ActionRecord>,
    pub stages: Vec<StageReport>,
}

/// Ad-hoc ranking request
#[derive(Debug, Clone, Deserialize)]
pub struct RankRequest {
    pub records: Vec<ActionRecord>,
    #[serde(default)]
    pub strategies: Option<Vec<StrategyKind>>,
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordActionResponse {
    pub user_id: String,
    pub session_id: String,
    pub stored: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecordsResponse {
    pub status: String,
    pub count: usize,
    pub data: Vec<ActionRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub breaker: String,
}
