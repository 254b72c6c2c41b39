//! Ordered credential/model fallback over a generative backend.

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

/// One (credential, model) pair in the fallback chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub api_key: String,
    pub model: String,
}

impl Candidate {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
        }
    }
}

/// Errors from a single backend attempt. Opaque beyond the overload
/// classification the pipeline cares about.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request transport failed: {0}")]
    Transport(String),

    #[error("backend returned status {status}: {body}")]
    Http { status: u16, body: String },

    #[error("backend returned an empty response")]
    Empty,
}

impl BackendError {
    /// Whether this failure looks like temporary overload rather than a
    /// permanent problem. Substring match on the known indicators.
    pub fn is_overloaded(&self) -> bool {
        match self {
            BackendError::Http { status, body } => {
                *status == 503 || body.contains("overloaded") || body.contains("503")
            }
            BackendError::Transport(reason) => {
                reason.contains("overloaded") || reason.contains("503")
            }
            BackendError::Empty => false,
        }
    }
}

/// A text-generation call against one concrete (credential, model)
/// pair. Implemented by [`super::GeminiClient`] and by test fakes.
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    async fn generate(
        &self,
        api_key: &str,
        model: &str,
        prompt: &str,
    ) -> Result<String, BackendError>;
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("The AI service is temporarily overloaded. Please try again shortly.")]
    Overloaded,

    #[error("The AI did not respond. Please try again later.")]
    Exhausted { attempts: usize },

    #[error("no backend candidates configured")]
    NoCandidates,
}

/// Fallback chain: candidates are attempted strictly in the caller's
/// order, each at most once; the first success wins. This is not a
/// load balancer, and nothing is aggregated across candidates.
pub struct AiGateway {
    backend: std::sync::Arc<dyn GenerativeBackend>,
    candidates: Vec<Candidate>,
}

impl AiGateway {
    pub fn new(backend: std::sync::Arc<dyn GenerativeBackend>, candidates: Vec<Candidate>) -> Self {
        Self {
            backend,
            candidates,
        }
    }

    pub async fn generate(&self, prompt: &str) -> Result<String, GatewayError> {
        if self.candidates.is_empty() {
            return Err(GatewayError::NoCandidates);
        }

        let mut saw_overload = false;

        for candidate in &self.candidates {
            match self
                .backend
                .generate(&candidate.api_key, &candidate.model, prompt)
                .await
            {
                Ok(text) => {
                    let text = text.trim().to_string();
                    if text.is_empty() {
                        warn!(model = %candidate.model, "backend returned empty text, falling back");
                        continue;
                    }
                    info!(model = %candidate.model, "backend responded");
                    return Ok(text);
                }
                Err(err) => {
                    saw_overload |= err.is_overloaded();
                    warn!(model = %candidate.model, %err, "candidate failed, trying next");
                }
            }
        }

        if saw_overload {
            Err(GatewayError::Overloaded)
        } else {
            Err(GatewayError::Exhausted {
                attempts: self.candidates.len(),
            })
        }
    }
}
