//! Unit tests for the store implementations.

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::tempdir;

    use crate::storage::{read_or_absent, FileStore, KeyValueStore, MemoryStore};

    #[tokio::test]
    async fn memory_round_trip() {
        let store = MemoryStore::new();
        store.set("k", json!({"a": 1})).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(json!({"a": 1})));

        store.remove("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn memory_set_replaces_whole_value() {
        let store = MemoryStore::new();
        store.set("list", json!([1, 2, 3])).await.unwrap();
        store.set("list", json!([4])).await.unwrap();
        assert_eq!(store.get("list").await.unwrap(), Some(json!([4])));
    }

    #[tokio::test]
    async fn file_store_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");

        let store = FileStore::open(&path);
        store.set("history", json!(["entry"])).await.unwrap();
        assert_eq!(store.get("history").await.unwrap(), Some(json!(["entry"])));

        // reopen: state survives
        let reopened = FileStore::open(&path);
        assert_eq!(
            reopened.get("history").await.unwrap(),
            Some(json!(["entry"]))
        );

        reopened.remove("history").await.unwrap();
        assert_eq!(reopened.get("history").await.unwrap(), None);
    }

    #[tokio::test]
    async fn file_store_missing_file_reads_absent() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path().join("never-written.json"));
        assert_eq!(store.get("anything").await.unwrap(), None);
    }

    #[tokio::test]
    async fn corrupt_file_degrades_to_absent_via_helper() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        tokio::fs::write(&path, b"not json at all").await.unwrap();

        let store = FileStore::open(&path);
        assert!(store.get("k").await.is_err());
        assert_eq!(read_or_absent(&store, "k").await, None);
    }
}
