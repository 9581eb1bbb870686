//! paperfeed-llm: LLM backend abstraction layer.
//! Implements the LlmBackend trait and construction of a backend
//! from configuration.

pub mod backend;
pub mod factory;

pub use backend::{
    AnthropicBackend, ChatCompletionsBackend, GeminiBackend, LlmBackend, LlmError, LlmRequest,
    LlmResponse, Message, Role,
};
pub use factory::{build_backend, BackendConfig, BackendKind};
