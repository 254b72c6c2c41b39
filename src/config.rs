//! Environment-backed gateway configuration.
//!
//! Credentials pair with models by position: the primary key drives the
//! primary model, the fallback key the fallback model. Adding a third
//! candidate is a list append, not new code.

use std::env;
use std::time::Duration;

use anyhow::{bail, Result};

use crate::llm::Candidate;

pub const PRIMARY_KEY_VAR: &str = "GOOGLE_AI_API_KEY";
pub const FALLBACK_KEY_VAR: &str = "GOOGLE_API_KEY";

pub const DEFAULT_MODELS: [&str; 2] = ["gemini-1.5-flash-latest", "gemini-pro"];
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub candidates: Vec<Candidate>,
    pub request_timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            candidates: Vec::new(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl GatewayConfig {
    /// Load credentials from the environment (and a `.env` file in
    /// development). Fails when no key is configured at all.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let candidates = candidates_from(
            env::var(PRIMARY_KEY_VAR).ok(),
            env::var(FALLBACK_KEY_VAR).ok(),
        );

        if candidates.is_empty() {
            bail!(
                "no AI credentials configured: set {} or {}",
                PRIMARY_KEY_VAR,
                FALLBACK_KEY_VAR
            );
        }

        Ok(Self {
            candidates,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn candidates_from(primary_key: Option<String>, fallback_key: Option<String>) -> Vec<Candidate> {
    [primary_key, fallback_key]
        .into_iter()
        .zip(DEFAULT_MODELS)
        .filter_map(|(key, model)| {
            let key = key?;
            if key.trim().is_empty() {
                None
            } else {
                Some(Candidate::new(key, model))
            }
        })
        .collect()
}
