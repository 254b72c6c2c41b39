//! Validation and repair of structured backend responses.
//!
//! Models wrap JSON in code fences and sometimes in a `{"questions":
//! [...]}` envelope; both are tolerated here, once, at this boundary.
//! Everything else about the payload is strict: exactly two elements,
//! each carrying `question`, `answer` and `explanation`.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// How many questions a practice batch must contain. A response with
/// any other count is rejected whole; there is no partial acceptance.
pub const PRACTICE_BATCH_SIZE: usize = 2;

#[derive(Debug, Error)]
pub enum ResponseError {
    #[error("response is not valid JSON: {reason}")]
    InvalidJson { reason: String },

    #[error("expected a JSON array of questions, found {found}")]
    NotAnArray { found: String },

    #[error("expected exactly {expected} questions, found {found}")]
    WrongCount { expected: usize, found: usize },

    #[error("question {index} is missing the `{field}` field")]
    MissingField { index: usize, field: &'static str },
}

/// One generated practice question. `answer` keeps the backend's exact
/// literal (number or string) so grading compares what was sent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PracticeQuestion {
    pub question: String,
    pub answer: Value,
    pub explanation: String,
}

/// The two shapes a structurally valid response arrives in.
#[derive(Deserialize)]
#[serde(untagged)]
enum Envelope {
    Bare(Vec<Value>),
    Wrapped { questions: Vec<Value> },
}

/// Strip one leading code fence (with optional language tag) and one
/// trailing fence, if present. Anything beyond that single layer is
/// the payload's problem.
pub fn strip_code_fence(raw: &str) -> String {
    let trimmed = raw.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }

    // opening fence: ``` plus optional tag up to end of line
    let opening = Regex::new(r"^```[a-z]*\n?").expect("static fence pattern");
    let without_open = opening.replace(trimmed, "");

    let closing = Regex::new(r"```\s*$").expect("static fence pattern");
    closing.replace(&without_open, "").trim().to_string()
}

/// Parse raw backend text into a validated practice batch.
pub fn parse_practice_batch(raw: &str) -> Result<Vec<PracticeQuestion>, ResponseError> {
    let cleaned = strip_code_fence(raw);

    let parsed: Value =
        serde_json::from_str(&cleaned).map_err(|err| ResponseError::InvalidJson {
            reason: err.to_string(),
        })?;

    let items = match serde_json::from_value::<Envelope>(parsed.clone()) {
        Ok(Envelope::Bare(items)) => items,
        Ok(Envelope::Wrapped { questions }) => questions,
        Err(_) => {
            return Err(ResponseError::NotAnArray {
                found: describe(&parsed),
            })
        }
    };

    if items.len() != PRACTICE_BATCH_SIZE {
        return Err(ResponseError::WrongCount {
            expected: PRACTICE_BATCH_SIZE,
            found: items.len(),
        });
    }

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| to_question(index, item))
        .collect()
}

fn to_question(index: usize, item: Value) -> Result<PracticeQuestion, ResponseError> {
    let missing = |field| ResponseError::MissingField { index, field };

    let obj = match item {
        Value::Object(obj) => obj,
        _ => return Err(missing("question")),
    };

    let question = obj
        .get("question")
        .and_then(Value::as_str)
        .ok_or_else(|| missing("question"))?
        .to_string();
    let answer = obj.get("answer").cloned().ok_or_else(|| missing("answer"))?;
    let explanation = obj
        .get("explanation")
        .and_then(Value::as_str)
        .ok_or_else(|| missing("explanation"))?
        .to_string();

    Ok(PracticeQuestion {
        question,
        answer,
        explanation,
    })
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(_) => "a boolean".to_string(),
        Value::Number(_) => "a number".to_string(),
        Value::String(_) => "a string".to_string(),
        Value::Array(_) => "an array".to_string(),
        Value::Object(_) => "an object".to_string(),
    }
}
