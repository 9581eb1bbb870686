//! paperfeed-common: Shared paper types and errors used across all paperfeed crates.

pub mod error;
pub mod paper;

// Re-export commonly used types
pub use error::{PaperError, Result};
pub use paper::PaperRecord;
