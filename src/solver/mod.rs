//! The solve flow: images and/or typed text in, step-by-step
//! explanation out, one history record per successful request.
//!
//! Solving carries no quota in this app; only practice generation is
//! admission-gated. Within one request the stages are strictly
//! sequential: OCR, compose, generate, persist.

use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::{InputError, PipelineError};
use crate::history::{now_ms, HistoryRecorder, SolveResult, SOLVE_HISTORY_KEY};
use crate::llm::AiGateway;
use crate::ocr::{extract_text_from_images, ImageRef, OcrEngine};
use crate::prompt::compose_solve_prompt;
use crate::storage::KeyValueStore;

pub const MAX_IMAGES: usize = 3;

pub struct Solver {
    ocr: Arc<dyn OcrEngine>,
    gateway: AiGateway,
    history: HistoryRecorder,
}

impl Solver {
    pub fn new(ocr: Arc<dyn OcrEngine>, gateway: AiGateway, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            ocr,
            gateway,
            history: HistoryRecorder::new(store),
        }
    }

    /// Solve one problem. Fire-and-forget after submission: once the
    /// backend call is issued it runs to completion, and a successful
    /// result is persisted whether or not the caller is still looking.
    #[instrument(skip_all, fields(request_id = %Uuid::new_v4(), images = images.len()))]
    pub async fn solve(
        &self,
        images: &[ImageRef],
        question_text: &str,
    ) -> Result<String, PipelineError> {
        if images.len() > MAX_IMAGES {
            return Err(InputError::TooManyImages {
                max: MAX_IMAGES,
                got: images.len(),
            }
            .into());
        }

        let extracted = if images.is_empty() {
            String::new()
        } else {
            extract_text_from_images(self.ocr.as_ref(), images).await
        };

        let question_text = question_text.trim();
        if question_text.is_empty() && extracted.is_empty() {
            return Err(InputError::EmptyProblem.into());
        }

        let prompt = compose_solve_prompt(&extracted, question_text);
        let explanation = self.gateway.generate(&prompt).await?;

        let record = SolveResult {
            question: if question_text.is_empty() {
                extracted
            } else {
                question_text.to_string()
            },
            explanation: explanation.clone(),
            timestamp: now_ms(),
        };
        self.history.append(SOLVE_HISTORY_KEY, &record).await?;

        info!("solve request completed");
        Ok(explanation)
    }

    /// Full solve history, newest first.
    pub async fn history(&self) -> Vec<SolveResult> {
        self.history.load(SOLVE_HISTORY_KEY).await
    }

    /// Wipe the solve history. Explicit user action.
    pub async fn clear_history(&self) -> Result<(), PipelineError> {
        Ok(self.history.clear(SOLVE_HISTORY_KEY).await?)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use std::sync::Mutex;

    use super::*;
    use crate::llm::gateway::BackendError;
    use crate::llm::{Candidate, GenerativeBackend};
    use crate::ocr::OcrError;
    use crate::storage::MemoryStore;

    struct FixedOcr(Vec<String>);

    #[async_trait]
    impl OcrEngine for FixedOcr {
        async fn recognize(&self, _image: &ImageRef) -> Result<Vec<String>, OcrError> {
            Ok(self.0.clone())
        }
    }

    struct FixedBackend {
        replies: Mutex<Vec<Result<String, BackendError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl FixedBackend {
        fn new(replies: Vec<Result<String, BackendError>>) -> Self {
            Self {
                replies: Mutex::new(replies),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl GenerativeBackend for FixedBackend {
        async fn generate(
            &self,
            _api_key: &str,
            _model: &str,
            prompt: &str,
        ) -> Result<String, BackendError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies.lock().unwrap().remove(0)
        }
    }

    fn solver_with(
        ocr_text: Vec<String>,
        replies: Vec<Result<String, BackendError>>,
    ) -> (Solver, Arc<MemoryStore>, Arc<FixedBackend>) {
        let store = Arc::new(MemoryStore::new());
        let backend = Arc::new(FixedBackend::new(replies));
        let gateway = AiGateway::new(
            backend.clone(),
            vec![Candidate::new("key", "model")],
        );
        let solver = Solver::new(Arc::new(FixedOcr(ocr_text)), gateway, store.clone());
        (solver, store, backend)
    }

    #[tokio::test]
    async fn empty_input_is_rejected_before_any_call() {
        let (solver, _store, backend) = solver_with(vec![], vec![]);
        let err = solver.solve(&[], "   ").await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Input(InputError::EmptyProblem)
        ));
        assert!(backend.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn too_many_images_are_rejected() {
        let (solver, _store, _backend) = solver_with(vec![], vec![]);
        let images: Vec<ImageRef> = (0..4).map(|i| ImageRef::new(format!("img{i}"))).collect();
        let err = solver.solve(&images, "q").await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Input(InputError::TooManyImages { max: 3, got: 4 })
        ));
    }

    #[tokio::test]
    async fn success_persists_one_record_with_the_typed_question() {
        let (solver, _store, _backend) =
            solver_with(vec![], vec![Ok("step 1: think".into())]);
        let explanation = solver.solve(&[], "what is 2+2?").await.unwrap();
        assert_eq!(explanation, "step 1: think");

        let history = solver.history().await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].question, "what is 2+2?");
        assert_eq!(history[0].explanation, "step 1: think");
    }

    #[tokio::test]
    async fn image_only_request_uses_extracted_text_as_question() {
        let (solver, _store, backend) = solver_with(
            vec!["2 × 2 = ?".into()],
            vec![Ok("four".into())],
        );
        solver
            .solve(&[ImageRef::new("img://0")], "")
            .await
            .unwrap();

        let prompts = backend.prompts.lock().unwrap();
        assert!(prompts[0].contains("Extracted problem from image:\n2 * 2 = ?"));
        drop(prompts);

        let history = solver.history().await;
        assert_eq!(history[0].question, "2 * 2 = ?");
    }

    #[tokio::test]
    async fn gateway_failure_persists_nothing() {
        let (solver, _store, _backend) = solver_with(
            vec![],
            vec![Err(BackendError::Transport("down".into()))],
        );
        let err = solver.solve(&[], "q").await.unwrap_err();
        assert!(matches!(err, PipelineError::Upstream(_)));
        assert!(solver.history().await.is_empty());
    }

    #[tokio::test]
    async fn newest_solve_lands_first_in_history() {
        let (solver, _store, _backend) = solver_with(
            vec![],
            vec![Ok("first".into()), Ok("second".into())],
        );
        solver.solve(&[], "q1").await.unwrap();
        solver.solve(&[], "q2").await.unwrap();

        let history = solver.history().await;
        assert_eq!(history[0].question, "q2");
        assert_eq!(history[1].question, "q1");
    }
}
