//! Single-file JSON store: one object, keys at the top level.
//!
//! Every operation reads and rewrites the whole file. Fine for the
//! handful of small lists this app keeps; not a database.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use super::{KeyValueStore, StorageError};

pub struct FileStore {
    path: PathBuf,
    // serializes read-modify-write cycles within this process
    lock: Mutex<()>,
}

impl FileStore {
    /// Open or create a store file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> Result<Map<String, Value>, String> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice::<Value>(&bytes)
                .map_err(|e| e.to_string())
                .and_then(|v| match v {
                    Value::Object(map) => Ok(map),
                    other => Err(format!("expected a JSON object, found {}", other)),
                }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Map::new()),
            Err(err) => Err(err.to_string()),
        }
    }

    async fn save(&self, map: &Map<String, Value>) -> Result<(), String> {
        let bytes = serde_json::to_vec(&Value::Object(map.clone())).map_err(|e| e.to_string())?;
        tokio::fs::write(&self.path, bytes)
            .await
            .map_err(|e| e.to_string())
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let _guard = self.lock.lock().await;
        let map = self.load().await.map_err(|reason| StorageError::Read {
            key: key.to_string(),
            reason,
        })?;
        Ok(map.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        let mut map = self.load().await.map_err(|reason| StorageError::Write {
            key: key.to_string(),
            reason: format!("reload before write: {}", reason),
        })?;
        map.insert(key.to_string(), value);
        self.save(&map).await.map_err(|reason| StorageError::Write {
            key: key.to_string(),
            reason,
        })
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        let mut map = self.load().await.map_err(|reason| StorageError::Remove {
            key: key.to_string(),
            reason: format!("reload before remove: {}", reason),
        })?;
        if map.remove(key).is_some() {
            self.save(&map)
                .await
                .map_err(|reason| StorageError::Remove {
                    key: key.to_string(),
                    reason,
                })?;
        }
        Ok(())
    }
}
