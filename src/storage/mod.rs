//! Key-value persistence boundary.
//!
//! Everything the pipeline persists (history lists, quota counters,
//! preferences) goes through [`KeyValueStore`]: arbitrary JSON values
//! under string keys, no transactions, full-replacement writes.

pub mod file;
pub mod memory;
mod tests;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

pub use file::FileStore;
pub use memory::MemoryStore;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("failed to read key `{key}`: {reason}")]
    Read { key: String, reason: String },

    #[error("failed to write key `{key}`: {reason}")]
    Write { key: String, reason: String },

    #[error("failed to remove key `{key}`: {reason}")]
    Remove { key: String, reason: String },
}

/// JSON-under-string-key storage, owned by the surrounding app.
///
/// Implementations replace the whole value on `set`; read-modify-write
/// callers get last-write-wins semantics, nothing stronger.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError>;

    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError>;

    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Read a key, degrading to absent on failure.
///
/// Failed reads are treated as "no state yet" everywhere in the
/// pipeline; only writes can fail a gated operation.
pub async fn read_or_absent(store: &dyn KeyValueStore, key: &str) -> Option<Value> {
    match store.get(key).await {
        Ok(value) => value,
        Err(err) => {
            warn!(key, %err, "storage read failed, treating as absent");
            None
        }
    }
}
