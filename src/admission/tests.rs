//! Unit tests: pure transitions with a simulated clock, controller
//! behavior against in-memory and failing stores.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use serde_json::Value;

    use crate::admission::{
        consume, evaluate, Admission, AdmissionController, AdmissionError, DenyReason, Feature,
        QuotaConfig, QuotaState, COOLDOWN_MS,
    };
    use crate::storage::{KeyValueStore, MemoryStore, StorageError};

    /// Store whose writes always fail; reads delegate to a real one.
    struct ReadOnlyStore {
        inner: MemoryStore,
    }

    #[async_trait]
    impl KeyValueStore for ReadOnlyStore {
        async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, _value: Value) -> Result<(), StorageError> {
            Err(StorageError::Write {
                key: key.to_string(),
                reason: "disk full".into(),
            })
        }

        async fn remove(&self, key: &str) -> Result<(), StorageError> {
            Err(StorageError::Remove {
                key: key.to_string(),
                reason: "disk full".into(),
            })
        }
    }

    fn config() -> QuotaConfig {
        QuotaConfig::default()
    }

    #[test]
    fn open_state_allows_under_the_limit() {
        let mut state = QuotaState::default();
        for _ in 0..5 {
            match evaluate(&state, 1_000, &config()) {
                Admission::Allow { next } => state = consume(&next),
                other => panic!("expected allow, got {:?}", other),
            }
        }
        assert_eq!(state.count, 5);
    }

    #[test]
    fn sixth_request_starts_cooldown() {
        let state = QuotaState {
            count: 5,
            cooldown_start: None,
        };
        match evaluate(&state, 42_000, &config()) {
            Admission::Deny { reason, next } => {
                assert_eq!(reason, DenyReason::LimitReached);
                assert_eq!(next.cooldown_start, Some(42_000));
            }
            other => panic!("expected deny, got {:?}", other),
        }
    }

    #[test]
    fn locked_state_reports_minutes_remaining() {
        let state = QuotaState {
            count: 5,
            cooldown_start: Some(0),
        };
        // 30 minutes in: 90 minutes left
        match evaluate(&state, 30 * 60_000, &config()) {
            Admission::Deny {
                reason: DenyReason::CooldownActive { minutes },
                ..
            } => assert_eq!(minutes, 90),
            other => panic!("expected cooldown deny, got {:?}", other),
        }
        // 1 ms in: ceil rounds up to the full window
        match evaluate(&state, 1, &config()) {
            Admission::Deny {
                reason: DenyReason::CooldownActive { minutes },
                ..
            } => assert_eq!(minutes, 120),
            other => panic!("expected cooldown deny, got {:?}", other),
        }
    }

    #[test]
    fn expired_cooldown_resets_and_allows() {
        let state = QuotaState {
            count: 5,
            cooldown_start: Some(0),
        };
        match evaluate(&state, COOLDOWN_MS, &config()) {
            Admission::Allow { next } => {
                assert_eq!(next, QuotaState::default());
                assert_eq!(consume(&next).count, 1);
            }
            other => panic!("expected allow after expiry, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn full_quota_cycle_against_store() {
        let store = Arc::new(MemoryStore::new());
        let controller = AdmissionController::new(Feature::Practice, store);

        // five successful requests
        for i in 1..=5 {
            controller.admit(1_000).await.unwrap();
            controller.record_use().await.unwrap();
            assert_eq!(controller.state().await.count, i);
        }

        // sixth is denied and starts the cooldown
        match controller.admit(2_000).await {
            Err(AdmissionError::LimitReached { hours }) => assert_eq!(hours, 2),
            other => panic!("expected limit reached, got {:?}", other),
        }
        assert_eq!(controller.state().await.cooldown_start, Some(2_000));

        // still inside the window: denied with minutes remaining
        match controller.admit(2_000 + 60_000).await {
            Err(AdmissionError::CooldownActive { minutes }) => assert_eq!(minutes, 119),
            other => panic!("expected cooldown active, got {:?}", other),
        }

        // past the window: allowed again, counter restarts at 1
        controller.admit(2_000 + COOLDOWN_MS).await.unwrap();
        controller.record_use().await.unwrap();
        let state = controller.state().await;
        assert_eq!(state.count, 1);
        assert_eq!(state.cooldown_start, None);
    }

    #[tokio::test]
    async fn bypass_overrides_all_checks() {
        let store = Arc::new(MemoryStore::new());
        let controller = AdmissionController::new(Feature::Practice, store);

        // exhaust the quota first
        for _ in 0..5 {
            controller.admit(0).await.unwrap();
            controller.record_use().await.unwrap();
        }
        assert!(controller.admit(1).await.is_err());

        controller.set_bypass(true).await.unwrap();
        for _ in 0..100 {
            controller.admit(1).await.unwrap();
            controller.record_use().await.unwrap();
        }
        // count never moved from its pre-bypass value
        assert_eq!(controller.state().await.count, 5);

        controller.set_bypass(false).await.unwrap();
        assert!(controller.admit(1).await.is_err());
    }

    #[tokio::test]
    async fn bypass_flags_are_independent_per_feature() {
        let store = Arc::new(MemoryStore::new());
        let practice = AdmissionController::new(Feature::Practice, store.clone());
        let solve = AdmissionController::new(Feature::Solve, store);

        practice.set_bypass(true).await.unwrap();
        assert!(practice.is_bypassed().await);
        assert!(!solve.is_bypassed().await);
    }

    #[tokio::test]
    async fn persistence_failure_fails_closed() {
        let inner = MemoryStore::new();
        // expired cooldown forces a reset write on the allow path
        inner
            .set(
                "practice_quota",
                serde_json::json!({"count": 5, "cooldown_start": 0}),
            )
            .await
            .unwrap();
        let store = Arc::new(ReadOnlyStore { inner });
        let controller = AdmissionController::new(Feature::Practice, store);

        match controller.admit(COOLDOWN_MS + 1).await {
            Err(AdmissionError::Storage(_)) => {}
            other => panic!("expected fail-closed storage denial, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn garbage_quota_state_degrades_to_zero() {
        let store = Arc::new(MemoryStore::new());
        store
            .set("practice_quota", serde_json::json!("not an object"))
            .await
            .unwrap();
        let controller = AdmissionController::new(Feature::Practice, store);
        assert_eq!(controller.state().await, QuotaState::default());
        controller.admit(0).await.unwrap();
    }
}
