//! User action records
//!
//! - `RecordSource` abstraction with an in-memory implementation
//! - Synthetic history generation for local runs
//! - Usage pattern summaries and history rendering

pub mod patterns;
pub mod store;
pub mod synthetic;

pub use patterns::{format_history, UserPatterns};
pub use store::{InMemoryRecordStore, RecordSource};
