use std::time::Duration;

use paperfeed_llm::LlmError;
use thiserror::Error;

/// Failure of a single generation call. Provider errors are opaque here.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("provider error: {0}")]
    Provider(#[from] LlmError),

    #[error("generation timed out after {0:?}")]
    Timeout(Duration),

    #[error("malformed response: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum QaError {
    #[error("Failed to answer \"{question}\": {source}")]
    Generation {
        question: String,
        #[source]
        source: GenerationError,
    },

    /// The detached run panicked or was cancelled by runtime shutdown.
    #[error("Q&A for {paper_id} was interrupted: {reason}")]
    Interrupted { paper_id: String, reason: String },
}

impl QaError {
    /// The question that could not be answered, when one is known.
    pub fn question(&self) -> Option<&str> {
        match self {
            QaError::Generation { question, .. } => Some(question),
            QaError::Interrupted { .. } => None,
        }
    }
}
