//! OCR engine boundary and multi-image text extraction.
//!
//! The engine itself (ML Kit or whatever the shell ships) lives outside
//! this crate; we only orchestrate it: scan each image, clean the
//! fragments, drop adjacent duplicates, join. A request never fails
//! because OCR came back empty.

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

use crate::preprocessing::{clean_extracted_text, dedupe_consecutive};

/// Minimum length of text we consider "usable".
pub const MIN_EXTRACTED_CHARS: usize = 8;

/// Reference to an image the user captured or picked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub uri: String,
}

impl ImageRef {
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into() }
    }
}

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("scan failed for `{uri}`: {reason}")]
    Scan { uri: String, reason: String },
}

/// Text recognition over a single image, best-effort.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Returns the raw text fragments found in the image, in reading
    /// order. An empty list is a valid result, not an error.
    async fn recognize(&self, image: &ImageRef) -> Result<Vec<String>, OcrError>;
}

/// Extract and clean text from multiple images.
///
/// Per-image failures are logged and skipped; cleaned per-image chunks
/// are deduped (adjacent only) and joined with blank lines. Total:
/// always returns a string, possibly empty.
pub async fn extract_text_from_images(engine: &dyn OcrEngine, images: &[ImageRef]) -> String {
    let mut cleaned_chunks = Vec::with_capacity(images.len());

    for image in images {
        match engine.recognize(image).await {
            Ok(fragments) => {
                let combined = fragments.join(" ");
                let cleaned = clean_extracted_text(&combined);
                if cleaned.is_empty() {
                    warn!(uri = %image.uri, "no usable text found in image");
                } else {
                    cleaned_chunks.push(cleaned);
                }
            }
            Err(err) => {
                warn!(uri = %image.uri, %err, "image scan failed, skipping");
            }
        }
    }

    let final_text = dedupe_consecutive(cleaned_chunks).join("\n\n");

    if !final_text.is_empty() && final_text.len() < MIN_EXTRACTED_CHARS {
        warn!(
            chars = final_text.len(),
            "extracted text is very short, solver may struggle"
        );
    }

    final_text
}
