//! Prompt composition for the two request kinds.

/// Build the solver prompt from labeled parts, each included only when
/// non-empty, ending with the step-by-step instruction.
pub fn compose_solve_prompt(extracted_text: &str, question_text: &str) -> String {
    let mut parts = Vec::with_capacity(3);

    if !extracted_text.is_empty() {
        parts.push(format!("Extracted problem from image:\n{}", extracted_text));
    }
    if !question_text.is_empty() {
        parts.push(format!("User prompt:\n{}", question_text));
    }
    parts.push("Please solve the problem step-by-step and explain clearly.".to_string());

    parts.join("\n\n")
}

/// Build the practice-generation prompt.
///
/// The backend is told to mimic the embedded format exactly: a raw JSON
/// array of exactly two objects with `question`, `answer` and
/// `explanation` keys, consistent with each other, no fences or
/// trailing commentary.
pub fn compose_practice_prompt(topic: &str, grade: &str, difficulty: &str) -> String {
    format!(
        r#"Generate 2 math questions with integer-only answers for a {grade} student at {difficulty} level.
Topic: {topic}

Respond ONLY with a valid raw JSON array.

Use this exact format:
[
  {{
    "question": "What is 4 + 2?",
    "answer": 6,
    "explanation": "4 + 2 equals 6."
  }},
  {{
    "question": "What is 9 - 5?",
    "answer": 4,
    "explanation": "9 - 5 equals 4."
  }}
]

Return ONLY valid JSON (array format) with no extra commas, code fences or surrounding text.
The answer and the explanation must agree: never state the answer is X while the explanation works out to Y."#
    )
}
