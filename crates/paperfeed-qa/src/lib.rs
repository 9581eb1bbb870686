//! paperfeed-qa: on-demand question answering about a paper.
//!
//! A fixed, ordered list of questions is asked about every paper. Answers
//! are produced by an [`AnswerGenerator`] (normally an LLM backend), cached
//! per paper for the life of the process, and exposed as progress so the UI
//! can poll while generation runs.

pub mod error;
pub mod generator;
pub mod processor;
pub mod progress;

pub use error::{GenerationError, QaError};
pub use generator::{AnswerGenerator, LlmAnswerGenerator, PaperContext};
pub use processor::QaProcessor;
pub use progress::{QaPair, QaProgress, QaStatus};
