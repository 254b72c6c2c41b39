//! Newest-first history lists behind the key-value boundary.
//!
//! Appends are read-modify-write with no locking: two overlapping
//! requests can lose one update (last write wins). Accepted for a
//! single-user local store; readers sort by the per-record timestamp,
//! not by list position, so nothing downstream depends on write order.

use std::sync::Arc;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::storage::{read_or_absent, KeyValueStore, StorageError};

pub const SOLVE_HISTORY_KEY: &str = "history";
pub const PRACTICE_HISTORY_KEY: &str = "practice_history";
pub const GENERATED_QUESTIONS_KEY: &str = "practice_questions";

/// Epoch milliseconds, the timestamp unit of every record here.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// One solved problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveResult {
    pub question: String,
    pub explanation: String,
    pub timestamp: i64,
}

/// One answered practice question. `explanation` is empty when the
/// answer was judged correct; review screens only show it for misses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PracticeRecord {
    pub question: String,
    pub answer: Value,
    pub explanation: String,
    pub user_answer: String,
    pub timestamp: i64,
}

/// Log entry for a generated (not yet answered) question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedQuestion {
    pub question: String,
    pub answer: Value,
    pub explanation: String,
    pub topic: String,
    pub timestamp: i64,
}

/// Append-only access to the named history lists.
pub struct HistoryRecorder {
    store: Arc<dyn KeyValueStore>,
}

impl HistoryRecorder {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Prepend one record to the list under `key`.
    pub async fn append<T: Serialize>(&self, key: &str, record: &T) -> Result<(), StorageError> {
        self.append_batch(key, std::slice::from_ref(record)).await
    }

    /// Prepend a batch, preserving its internal order at the head.
    pub async fn append_batch<T: Serialize>(
        &self,
        key: &str,
        records: &[T],
    ) -> Result<(), StorageError> {
        let mut list: Vec<Value> = Vec::with_capacity(records.len());
        for record in records {
            list.push(
                serde_json::to_value(record).map_err(|e| StorageError::Write {
                    key: key.to_string(),
                    reason: e.to_string(),
                })?,
            );
        }
        list.extend(self.load_raw(key).await);
        self.store.set(key, Value::Array(list)).await
    }

    /// All records under `key`, newest first. Absent, unreadable or
    /// non-list state degrades to empty.
    pub async fn load<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        self.load_raw(key)
            .await
            .into_iter()
            .filter_map(|value| match serde_json::from_value(value) {
                Ok(record) => Some(record),
                Err(err) => {
                    warn!(key, %err, "skipping malformed history entry");
                    None
                }
            })
            .collect()
    }

    /// The records sharing the list's maximum timestamp. This is how a
    /// just-written set of two questions is grouped without a group id.
    pub async fn latest_set<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        let raw = self.load_raw(key).await;
        let latest = raw
            .iter()
            .filter_map(|entry| entry.get("timestamp").and_then(Value::as_i64))
            .max();

        let Some(latest) = latest else {
            return Vec::new();
        };

        raw.into_iter()
            .filter(|entry| entry.get("timestamp").and_then(Value::as_i64) == Some(latest))
            .filter_map(|entry| serde_json::from_value(entry).ok())
            .collect()
    }

    /// Overwrite the list with an empty one. Explicit user action; the
    /// pipeline itself never evicts.
    pub async fn clear(&self, key: &str) -> Result<(), StorageError> {
        self.store.set(key, Value::Array(Vec::new())).await
    }

    async fn load_raw(&self, key: &str) -> Vec<Value> {
        match read_or_absent(self.store.as_ref(), key).await {
            Some(Value::Array(list)) => list,
            Some(_) => {
                warn!(key, "history key holds a non-list value, treating as empty");
                Vec::new()
            }
            None => Vec::new(),
        }
    }
}
