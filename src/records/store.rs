//! Action record source

use crate::error::{Error, Result};
use crate::ranking::ActionRecord;
use async_trait::async_trait;
use dashmap::DashMap;
use std::cmp::Reverse;
use std::path::Path;
use tracing::{debug, info};

/// Read access to a user's logged actions
///
/// Implementations hand out owned copies so concurrent ranking calls never
/// share record instances.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Most recent actions first, at most `limit`
    async fn recent_actions(&self, user_id: &str, limit: usize) -> Result<Vec<ActionRecord>>;

    /// Persist a new action
    async fn append(&self, record: ActionRecord) -> Result<()>;

    /// Connectivity check used by the health endpoint
    async fn ping(&self) -> Result<()>;
}

/// Concurrent in-memory store keyed by user id
#[derive(Default)]
pub struct InMemoryRecordStore {
    records: DashMap<String, Vec<ActionRecord>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `records`
    pub fn with_records(records: impl IntoIterator<Item = ActionRecord>) -> Self {
        let store = Self::new();
        store.extend(records);
        store
    }

    /// Load a JSON array of records from disk
    pub fn load_json_file(&self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Storage(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let records: Vec<ActionRecord> = serde_json::from_str(&raw)?;
        let count = records.len();
        self.extend(records);

        info!("Loaded {} action records from {}", count, path.display());
        Ok(count)
    }

    pub fn extend(&self, records: impl IntoIterator<Item = ActionRecord>) {
        for record in records {
            self.records
                .entry(record.user_id.clone())
                .or_default()
                .push(record.without_annotations());
        }
    }

    /// Total number of stored records
    pub fn len(&self) -> usize {
        self.records.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn user_count(&self) -> usize {
        self.records.len()
    }
}

#[async_trait]
impl RecordSource for InMemoryRecordStore {
    async fn recent_actions(&self, user_id: &str, limit: usize) -> Result<Vec<ActionRecord>> {
        let mut actions = self
            .records
            .get(user_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default();

        actions.sort_by_key(|r| Reverse(r.timestamp));
        actions.truncate(limit);

        debug!(user_id, count = actions.len(), "Loaded recent actions");
        Ok(actions)
    }

    async fn append(&self, record: ActionRecord) -> Result<()> {
        if record.user_id.is_empty() {
            return Err(Error::Validation("user_id cannot be empty".to_string()));
        }

        self.records
            .entry(record.user_id.clone())
            .or_default()
            .push(record.without_annotations());
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
