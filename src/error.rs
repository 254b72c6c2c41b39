//! Pipeline-boundary error taxonomy.
//!
//! Every failure resolves to one of five classes before it reaches the
//! caller, and the `Display` form of each is the user-facing message.
//! Nothing here panics its way into UI state.

use thiserror::Error;

use crate::admission::AdmissionError;
use crate::llm::{GatewayError, ResponseError};
use crate::storage::StorageError;

/// User-correctable problems, rejected before any I/O happens.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("Please provide a question or upload a valid image.")]
    EmptyProblem,

    #[error("Enter a topic to generate questions.")]
    EmptyTopic,

    #[error("A maximum of {max} images is supported.")]
    TooManyImages { max: usize, got: usize },

    #[error("There are no questions to submit.")]
    NothingToSubmit,

    #[error("Please answer all questions.")]
    IncompleteAnswers,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{0}")]
    Input(#[from] InputError),

    /// Quota or cooldown denial. Expected steady state, not a bug.
    #[error("{0}")]
    Quota(AdmissionError),

    /// OCR, network or backend trouble, including an exhausted
    /// fallback chain. Retry later.
    #[error("{0}")]
    Upstream(#[from] GatewayError),

    /// The backend answered, but not with something usable. Distinct
    /// from unavailability: rewording the input is the likely fix.
    #[error("The AI returned an unusable response. Try rewording your input.")]
    Validation(#[source] ResponseError),

    #[error("Saving your data failed. Please try again.")]
    Storage(#[source] StorageError),
}

impl From<AdmissionError> for PipelineError {
    fn from(err: AdmissionError) -> Self {
        match err {
            // fail-closed persistence denial is a storage problem, not
            // a quota the user ran into
            AdmissionError::Storage(inner) => PipelineError::Storage(inner),
            other => PipelineError::Quota(other),
        }
    }
}

impl From<ResponseError> for PipelineError {
    fn from(err: ResponseError) -> Self {
        PipelineError::Validation(err)
    }
}

impl From<StorageError> for PipelineError {
    fn from(err: StorageError) -> Self {
        PipelineError::Storage(err)
    }
}
