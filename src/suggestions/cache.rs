//! TTL cache for generated suggestions
//!
//! Keys combine the user id with a SHA-256 fingerprint of the history, so a
//! new action for the user naturally misses the cache.

use crate::ranking::ActionRecord;
use moka::future::Cache;
use sha2::{Digest, Sha256};
use std::time::Duration;

pub struct SuggestionCache {
    entries: Cache<String, String>,
}

impl SuggestionCache {
    pub fn new(ttl: Duration, max_entries: u64) -> Self {
        Self {
            entries: Cache::builder()
                .max_capacity(max_entries)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Cache key for a user's history
    pub fn key(user_id: &str, history: &[ActionRecord]) -> String {
        let mut hasher = Sha256::new();
        for action in history {
            hasher.update(action.session_id.as_bytes());
            hasher.update(b"|");
            hasher.update(action.timestamp.to_rfc3339().as_bytes());
            hasher.update(b"|");
            hasher.update(action.agent_used.as_bytes());
            hasher.update(b"|");
            hasher.update(action.task_type.as_bytes());
            hasher.update(b"|");
            hasher.update(action.completion_status.as_str().as_bytes());
            hasher.update(b"|");
            hasher.update(action.effective_priority().as_str().as_bytes());
            hasher.update(b"|");
            hasher.update(action.feedback_score.to_le_bytes());
            hasher.update(b"|");
            hasher.update(action.effective_reward().to_le_bytes());
            hasher.update(b"\n");
        }
        format!("{}:{}", user_id, hex::encode(hasher.finalize()))
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).await
    }

    pub async fn insert(&self, key: String, suggestions: String) {
        self.entries.insert(key, suggestions).await;
    }
}
