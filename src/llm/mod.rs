//! Generative-AI backend access.
//!
//! Three layers, outermost first:
//! - `gateway`: ordered (credential, model) fallback chain; tries each
//!   candidate once and returns the first success.
//! - `gemini`: the concrete REST backend behind the chain.
//! - `response`: turns raw backend text into validated practice
//!   batches.

pub mod gateway;
pub mod gemini;
pub mod response;

pub use gateway::{AiGateway, BackendError, Candidate, GatewayError, GenerativeBackend};
pub use gemini::GeminiClient;
pub use response::{parse_practice_batch, PracticeQuestion, ResponseError};
