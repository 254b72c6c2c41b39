//! Per-feature quota + cooldown admission control.
//!
//! Each feature owns a persisted [`QuotaState`]: how many requests it
//! has issued and, once the limit is hit, when the cooldown started.
//! The transition logic is a pure function of `(state, now_ms, config)`
//! so it can be tested without a clock or a store; the controller wraps
//! it with persistence. State changes are written before the gated
//! operation proceeds, and a failed write denies the request.

mod tests;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::storage::{read_or_absent, KeyValueStore, StorageError};

pub const MAX_QUERIES: u32 = 5;
pub const COOLDOWN_MS: i64 = 2 * 60 * 60 * 1000; // 2 hours

/// The two gated features. Quota, cooldown and bypass state are fully
/// independent between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    Solve,
    Practice,
}

impl Feature {
    pub fn name(&self) -> &'static str {
        match self {
            Feature::Solve => "solve",
            Feature::Practice => "practice",
        }
    }

    fn quota_key(&self) -> String {
        format!("{}_quota", self.name())
    }

    fn bypass_key(&self) -> String {
        format!("{}_bypass_limit", self.name())
    }
}

/// Persisted counter state. Absent in storage means the zero state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaState {
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub cooldown_start: Option<i64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QuotaConfig {
    pub max_queries: u32,
    pub cooldown_ms: i64,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            max_queries: MAX_QUERIES,
            cooldown_ms: COOLDOWN_MS,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AdmissionError {
    #[error("Cooldown active. Try again in {minutes} minutes.")]
    CooldownActive { minutes: i64 },

    #[error("Prompt limit reached. Try again in {hours} hours.")]
    LimitReached { hours: i64 },

    #[error("quota state could not be saved: {0}")]
    Storage(StorageError),
}

impl From<StorageError> for AdmissionError {
    fn from(err: StorageError) -> Self {
        AdmissionError::Storage(err)
    }
}

/// Outcome of one admission decision over a quota state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Proceed. `next` is the state to persist first (it differs from
    /// the input only when an expired cooldown was reset).
    Allow { next: QuotaState },
    /// Denied. `next` differs from the input when the denial itself
    /// starts the cooldown.
    Deny { reason: DenyReason, next: QuotaState },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    CooldownActive { minutes: i64 },
    LimitReached,
}

/// Pure admission transition.
///
/// LOCKED with time left denies with the minutes remaining; LOCKED past
/// the window resets the counter and re-evaluates as OPEN; OPEN at the
/// limit starts the cooldown and denies; OPEN under the limit allows.
pub fn evaluate(state: &QuotaState, now_ms: i64, config: &QuotaConfig) -> Admission {
    let mut current = state.clone();

    if let Some(start) = current.cooldown_start {
        let elapsed = now_ms - start;
        if elapsed < config.cooldown_ms {
            let remaining = config.cooldown_ms - elapsed;
            let minutes = (remaining + 60_000 - 1) / 60_000;
            return Admission::Deny {
                reason: DenyReason::CooldownActive { minutes },
                next: current,
            };
        }
        current = QuotaState::default();
    }

    if current.count >= config.max_queries {
        return Admission::Deny {
            reason: DenyReason::LimitReached,
            next: QuotaState {
                count: current.count,
                cooldown_start: Some(now_ms),
            },
        };
    }

    Admission::Allow { next: current }
}

/// One unit of quota spent. Callers decide when: practice generation
/// records a use only after the response validated.
pub fn consume(state: &QuotaState) -> QuotaState {
    QuotaState {
        count: state.count + 1,
        cooldown_start: state.cooldown_start,
    }
}

/// Admission gate for a single feature, backed by the injected store.
pub struct AdmissionController {
    feature: Feature,
    config: QuotaConfig,
    store: Arc<dyn KeyValueStore>,
}

impl AdmissionController {
    pub fn new(feature: Feature, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            feature,
            config: QuotaConfig::default(),
            store,
        }
    }

    pub fn with_config(mut self, config: QuotaConfig) -> Self {
        self.config = config;
        self
    }

    pub fn feature(&self) -> Feature {
        self.feature
    }

    /// Whether the developer bypass flag is set for this feature.
    pub async fn is_bypassed(&self) -> bool {
        read_or_absent(self.store.as_ref(), &self.feature.bypass_key())
            .await
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    /// Toggle the developer bypass. While set, all checks are skipped
    /// and the counter is left untouched.
    pub async fn set_bypass(&self, enabled: bool) -> Result<(), StorageError> {
        let key = self.feature.bypass_key();
        if enabled {
            info!(feature = self.feature.name(), "quota bypass enabled");
            self.store.set(&key, serde_json::Value::Bool(true)).await
        } else {
            info!(feature = self.feature.name(), "quota bypass disabled");
            self.store.remove(&key).await
        }
    }

    /// Gate one request at `now_ms`.
    ///
    /// Fail-closed: if a state transition cannot be persisted, the
    /// request is denied even though the pure evaluation allowed it.
    pub async fn admit(&self, now_ms: i64) -> Result<(), AdmissionError> {
        if self.is_bypassed().await {
            info!(
                feature = self.feature.name(),
                "bypass enabled, skipping limits and cooldowns"
            );
            return Ok(());
        }

        let state = self.load_state().await;
        match evaluate(&state, now_ms, &self.config) {
            Admission::Allow { next } => {
                if next != state {
                    self.persist_state(&next).await?;
                }
                debug!(
                    feature = self.feature.name(),
                    count = next.count,
                    "request admitted"
                );
                Ok(())
            }
            Admission::Deny { reason, next } => {
                if next != state {
                    // Best effort: the denial stands even if the
                    // cooldown start fails to persist.
                    if let Err(err) = self.persist_state(&next).await {
                        warn!(feature = self.feature.name(), %err, "failed to persist cooldown start");
                    }
                }
                Err(match reason {
                    DenyReason::CooldownActive { minutes } => {
                        AdmissionError::CooldownActive { minutes }
                    }
                    DenyReason::LimitReached => AdmissionError::LimitReached {
                        hours: self.config.cooldown_ms / 3_600_000,
                    },
                })
            }
        }
    }

    /// Record one consumed use. No-op while bypassed.
    pub async fn record_use(&self) -> Result<(), AdmissionError> {
        if self.is_bypassed().await {
            debug!(
                feature = self.feature.name(),
                "bypass enabled, not incrementing query count"
            );
            return Ok(());
        }

        let state = self.load_state().await;
        let next = consume(&state);
        self.persist_state(&next).await?;
        debug!(
            feature = self.feature.name(),
            count = next.count,
            "usage recorded"
        );
        Ok(())
    }

    /// Current counter state, for display and tests. Absent or
    /// unreadable state degrades to zero.
    pub async fn state(&self) -> QuotaState {
        self.load_state().await
    }

    async fn load_state(&self) -> QuotaState {
        read_or_absent(self.store.as_ref(), &self.feature.quota_key())
            .await
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default()
    }

    async fn persist_state(&self, state: &QuotaState) -> Result<(), StorageError> {
        let key = self.feature.quota_key();
        let value = serde_json::to_value(state).map_err(|e| StorageError::Write {
            key: key.clone(),
            reason: e.to_string(),
        })?;
        self.store.set(&key, value).await
    }
}
