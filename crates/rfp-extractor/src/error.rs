//! Error types for the Extractor

use rfp_llm::LlmError;
use thiserror::Error;

/// Errors that can occur during extraction
///
/// Only `TextTooLong` and `Config` abort a run; the other variants describe
/// per-chunk or per-item problems that the orchestrator records and skips.
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// LLM provider error (including exhaustion of every provider)
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// Text exceeds maximum length
    #[error("Text too long: {0} chars (max: {1})")]
    TextTooLong(usize, usize),

    /// LLM call exceeded the configured timeout
    #[error("Extraction timeout")]
    Timeout,

    /// No structured list could be recovered from the LLM output
    #[error("Unparsable response: {0}")]
    UnparsableResponse(String),

    /// A single malformed record inside an otherwise valid response
    #[error("Invalid candidate: {0}")]
    InvalidCandidate(String),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(String),

    /// File access error during import/export
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for ExtractorError {
    fn from(e: serde_json::Error) -> Self {
        ExtractorError::JsonParse(e.to_string())
    }
}
