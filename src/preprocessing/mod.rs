//! Text canonicalization for OCR output and answer comparison.

pub mod cleaner;

pub use cleaner::{clean_extracted_text, dedupe_consecutive, normalize_answer};
