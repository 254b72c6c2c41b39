//! Practice generation and submission flows.
//!
//! Generation is the admission-gated feature: check the gate, compose,
//! call the backend, validate the batch, and only then record the
//! quota use and log the generated questions. Submission grades the
//! user's answers against the batch and appends the records in one
//! timestamped group.


use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use crate::admission::{AdmissionController, Feature};
use crate::error::{InputError, PipelineError};
use crate::grading::grade;
use crate::history::{
    now_ms, GeneratedQuestion, HistoryRecorder, PracticeRecord, GENERATED_QUESTIONS_KEY,
    PRACTICE_HISTORY_KEY,
};
use crate::llm::{parse_practice_batch, AiGateway, PracticeQuestion};
use crate::prompt::compose_practice_prompt;
use crate::storage::{read_or_absent, KeyValueStore};

/// Developer sentinels, typed into the topic field. `/genoff` turns the
/// generation limits off, `/genon` turns them back on.
pub const BYPASS_ON_COMMAND: &str = "/genoff";
pub const BYPASS_OFF_COMMAND: &str = "/genon";

pub const GRADE_PREF_KEY: &str = "user_grade";
pub const DIFFICULTY_PREF_KEY: &str = "user_difficulty";

/// What a generation request produced: either questions, or the
/// acknowledgement of a bypass toggle.
#[derive(Debug, PartialEq)]
pub enum PracticeOutcome {
    Questions(Vec<PracticeQuestion>),
    BypassEnabled,
    BypassDisabled,
}

pub struct PracticeService {
    store: Arc<dyn KeyValueStore>,
    gateway: AiGateway,
    admission: AdmissionController,
    history: HistoryRecorder,
}

impl PracticeService {
    pub fn new(store: Arc<dyn KeyValueStore>, gateway: AiGateway) -> Self {
        Self {
            admission: AdmissionController::new(Feature::Practice, store.clone()),
            history: HistoryRecorder::new(store.clone()),
            store,
            gateway,
        }
    }

    /// Generate a batch of practice questions for `topic`.
    ///
    /// Empty `grade`/`difficulty` fall back to the saved preferences.
    /// Quota is consumed only after the response validates; a failed or
    /// unusable backend call costs nothing.
    #[instrument(skip_all, fields(request_id = %Uuid::new_v4()))]
    pub async fn generate(
        &self,
        topic: &str,
        grade: &str,
        difficulty: &str,
    ) -> Result<PracticeOutcome, PipelineError> {
        let topic = topic.trim();

        if topic.eq_ignore_ascii_case(BYPASS_ON_COMMAND) {
            self.admission.set_bypass(true).await?;
            return Ok(PracticeOutcome::BypassEnabled);
        }
        if topic.eq_ignore_ascii_case(BYPASS_OFF_COMMAND) {
            self.admission.set_bypass(false).await?;
            return Ok(PracticeOutcome::BypassDisabled);
        }

        if topic.is_empty() {
            return Err(InputError::EmptyTopic.into());
        }

        self.admission.admit(now_ms()).await?;

        let (grade, difficulty) = self.resolve_preferences(grade, difficulty).await;
        let prompt = compose_practice_prompt(topic, &grade, &difficulty);
        let raw = self.gateway.generate(&prompt).await?;
        let questions = parse_practice_batch(&raw)?;

        self.admission.record_use().await?;

        let timestamp = now_ms();
        let log_entries: Vec<GeneratedQuestion> = questions
            .iter()
            .map(|q| GeneratedQuestion {
                question: q.question.clone(),
                answer: q.answer.clone(),
                explanation: q.explanation.clone(),
                topic: topic.to_string(),
                timestamp,
            })
            .collect();
        self.history
            .append_batch(GENERATED_QUESTIONS_KEY, &log_entries)
            .await?;

        info!(count = questions.len(), "practice batch generated");
        Ok(PracticeOutcome::Questions(questions))
    }

    /// Grade and persist the user's answers to a generated batch.
    ///
    /// All records of one submission share a timestamp so the whole set
    /// can be recovered later as the "latest" group.
    #[instrument(skip_all, fields(questions = questions.len()))]
    pub async fn submit_answers(
        &self,
        questions: &[PracticeQuestion],
        answers: &[String],
    ) -> Result<Vec<PracticeRecord>, PipelineError> {
        if questions.is_empty() {
            return Err(InputError::NothingToSubmit.into());
        }
        if answers.len() != questions.len() || answers.iter().any(|a| a.trim().is_empty()) {
            return Err(InputError::IncompleteAnswers.into());
        }

        let timestamp = now_ms();
        let records: Vec<PracticeRecord> = questions
            .iter()
            .zip(answers)
            .map(|(question, answer)| grade(question, answer, timestamp))
            .collect();

        self.history
            .append_batch(PRACTICE_HISTORY_KEY, &records)
            .await?;

        info!(
            correct = records.iter().filter(|r| r.explanation.is_empty()).count(),
            "answers submitted"
        );
        Ok(records)
    }

    /// The most recently submitted set of records.
    pub async fn latest_set(&self) -> Vec<PracticeRecord> {
        self.history.latest_set(PRACTICE_HISTORY_KEY).await
    }

    /// Full practice history, newest first.
    pub async fn history(&self) -> Vec<PracticeRecord> {
        self.history.load(PRACTICE_HISTORY_KEY).await
    }

    /// Wipe the practice history. Explicit user action.
    pub async fn clear_history(&self) -> Result<(), PipelineError> {
        Ok(self.history.clear(PRACTICE_HISTORY_KEY).await?)
    }

    pub async fn save_preferences(
        &self,
        grade: &str,
        difficulty: &str,
    ) -> Result<(), PipelineError> {
        self.store
            .set(GRADE_PREF_KEY, serde_json::Value::String(grade.to_string()))
            .await?;
        self.store
            .set(
                DIFFICULTY_PREF_KEY,
                serde_json::Value::String(difficulty.to_string()),
            )
            .await?;
        Ok(())
    }

    pub async fn preferences(&self) -> (Option<String>, Option<String>) {
        let grade = read_or_absent(self.store.as_ref(), GRADE_PREF_KEY)
            .await
            .and_then(|v| v.as_str().map(str::to_string));
        let difficulty = read_or_absent(self.store.as_ref(), DIFFICULTY_PREF_KEY)
            .await
            .and_then(|v| v.as_str().map(str::to_string));
        (grade, difficulty)
    }

    /// The practice admission gate, exposed for status display.
    pub fn admission(&self) -> &AdmissionController {
        &self.admission
    }

    async fn resolve_preferences(&self, grade: &str, difficulty: &str) -> (String, String) {
        let (saved_grade, saved_difficulty) = self.preferences().await;
        let grade = if grade.trim().is_empty() {
            saved_grade.unwrap_or_default()
        } else {
            grade.trim().to_string()
        };
        let difficulty = if difficulty.trim().is_empty() {
            saved_difficulty.unwrap_or_default()
        } else {
            difficulty.trim().to_string()
        };
        (grade, difficulty)
    }
}
