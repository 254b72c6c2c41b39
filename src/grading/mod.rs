//! Practice answer grading.

use serde_json::Value;

use crate::history::PracticeRecord;
use crate::llm::PracticeQuestion;
use crate::preprocessing::normalize_answer;

/// The canonical answer as the literal the backend sent: strings
/// verbatim, numbers rendered in their JSON form.
fn answer_literal(answer: &Value) -> String {
    match answer {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Equality after normalization on both sides. Lenient string
/// comparison only; nothing is evaluated.
pub fn is_correct(user_answer: &str, canonical: &Value) -> bool {
    normalize_answer(user_answer) == normalize_answer(&answer_literal(canonical))
}

/// Grade one question into its history record.
///
/// A correct answer gets its explanation cleared; review screens only
/// show explanations for misses.
pub fn grade(question: &PracticeQuestion, user_answer: &str, timestamp: i64) -> PracticeRecord {
    let user_answer = user_answer.trim().to_string();
    let correct = is_correct(&user_answer, &question.answer);

    PracticeRecord {
        question: question.question.clone(),
        answer: question.answer.clone(),
        explanation: if correct {
            String::new()
        } else {
            question.explanation.clone()
        },
        user_answer,
        timestamp,
    }
}
