//! # Math Tutor Pipeline
//!
//! The request arbitration and AI-solving core of a mobile math tutor:
//! photograph or type a problem, get a step-by-step solution; ask for
//! practice questions at a grade/difficulty, answer them, review
//! history. The screens, navigation and storage primitives live in the
//! app shell; this crate owns everything between a tap and a persisted
//! result.
//!
//! ## Architecture
//!
//! ```text
//! UI event → admission check → OCR (if images) → prompt
//!          → gateway (credential/model fallback) → validation
//!          → history record → result
//! ```
//!
//! The shell plugs in three things: a [`storage::KeyValueStore`], an
//! [`ocr::OcrEngine`], and (optionally) a [`llm::GenerativeBackend`]
//! other than the default Gemini client.

pub mod admission;
pub mod config;
pub mod error;
pub mod grading;
pub mod history;
pub mod llm;
pub mod ocr;
pub mod practice;
pub mod preprocessing;
pub mod prompt;
pub mod solver;
pub mod storage;

use std::sync::Arc;

pub use config::GatewayConfig;
pub use error::{InputError, PipelineError};
pub use history::{PracticeRecord, SolveResult};
pub use llm::PracticeQuestion;
pub use ocr::ImageRef;
pub use practice::{PracticeOutcome, PracticeService};
pub use solver::Solver;

use llm::{AiGateway, GeminiClient, GenerativeBackend};
use ocr::OcrEngine;
use storage::KeyValueStore;

/// The two pipelines wired over one store and one backend. This is the
/// object the app shell holds onto.
pub struct TutorPipeline {
    pub solver: Solver,
    pub practice: PracticeService,
}

impl TutorPipeline {
    /// Wire the pipelines against the default Gemini backend.
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        ocr: Arc<dyn OcrEngine>,
        config: GatewayConfig,
    ) -> Self {
        let backend = Arc::new(GeminiClient::with_timeout(config.request_timeout()));
        Self::with_backend(store, ocr, backend, config)
    }

    /// Wire the pipelines against a caller-supplied backend.
    pub fn with_backend(
        store: Arc<dyn KeyValueStore>,
        ocr: Arc<dyn OcrEngine>,
        backend: Arc<dyn GenerativeBackend>,
        config: GatewayConfig,
    ) -> Self {
        let solve_gateway = AiGateway::new(backend.clone(), config.candidates.clone());
        let practice_gateway = AiGateway::new(backend, config.candidates);

        Self {
            solver: Solver::new(ocr, solve_gateway, store.clone()),
            practice: PracticeService::new(store, practice_gateway),
        }
    }
}

/// Install the default tracing subscriber, honoring `RUST_LOG`.
/// Call once from the app shell or a test harness; repeated calls are
/// ignored.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}
