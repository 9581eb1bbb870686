//! Backend construction from configuration.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::backend::{
    AnthropicBackend, ChatCompletionsBackend, GeminiBackend, LlmBackend, LlmError,
    OLLAMA_BASE_URL,
};

/// Supported providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Gemini,
    OpenAi,
    OpenAiCompatible,
    Anthropic,
    Ollama,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Gemini           => "gemini",
            BackendKind::OpenAi           => "openai",
            BackendKind::OpenAiCompatible => "openai_compatible",
            BackendKind::Anthropic        => "anthropic",
            BackendKind::Ollama           => "ollama",
        }
    }

    /// Whether the provider refuses requests without a key.
    pub fn requires_api_key(&self) -> bool {
        matches!(self, BackendKind::Gemini | BackendKind::OpenAi | BackendKind::Anthropic)
    }
}

impl FromStr for BackendKind {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" | "google"                          => Ok(BackendKind::Gemini),
            "openai"                                     => Ok(BackendKind::OpenAi),
            "openai_compatible" | "openai-compatible"    => Ok(BackendKind::OpenAiCompatible),
            "anthropic" | "claude"                       => Ok(BackendKind::Anthropic),
            "ollama"                                     => Ok(BackendKind::Ollama),
            other => Err(LlmError::Unavailable(format!("unknown LLM backend '{other}'"))),
        }
    }
}

/// Everything needed to build one backend.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub kind: BackendKind,
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    /// Per-request HTTP timeout. A hung provider surfaces as an error
    /// once this elapses.
    pub timeout: Duration,
}

pub fn build_backend(cfg: &BackendConfig) -> Result<Arc<dyn LlmBackend>, LlmError> {
    let api_key = cfg.api_key.clone().filter(|k| !k.trim().is_empty());
    if cfg.kind.requires_api_key() && api_key.is_none() {
        return Err(LlmError::Unavailable(format!(
            "{} backend configured but no API key found",
            cfg.kind.as_str()
        )));
    }

    let client = reqwest::Client::builder().timeout(cfg.timeout).build()?;
    let key = api_key.clone().unwrap_or_default();

    let backend: Arc<dyn LlmBackend> = match cfg.kind {
        BackendKind::Gemini => {
            let mut b = GeminiBackend::new(key, &cfg.model).with_client(client);
            if let Some(url) = &cfg.base_url {
                b = b.with_base_url(url);
            }
            Arc::new(b)
        }
        BackendKind::Anthropic => {
            let mut b = AnthropicBackend::new(key, &cfg.model).with_client(client);
            if let Some(url) = &cfg.base_url {
                b = b.with_base_url(url);
            }
            Arc::new(b)
        }
        BackendKind::OpenAi => {
            let mut b = ChatCompletionsBackend::openai(key, &cfg.model);
            if let Some(url) = &cfg.base_url {
                b.base_url = url.clone();
            }
            Arc::new(b.with_client(client))
        }
        BackendKind::OpenAiCompatible => {
            let url = cfg.base_url.clone().ok_or_else(|| {
                LlmError::Unavailable("openai_compatible backend requires base_url".to_string())
            })?;
            Arc::new(ChatCompletionsBackend::compatible(url, &cfg.model, api_key).with_client(client))
        }
        BackendKind::Ollama => {
            let url = cfg.base_url.clone().unwrap_or_else(|| OLLAMA_BASE_URL.to_string());
            Arc::new(ChatCompletionsBackend::ollama(url, &cfg.model).with_client(client))
        }
    };

    tracing::info!(
        backend = cfg.kind.as_str(),
        model = backend.model_id(),
        is_local = backend.is_local(),
        "LLM backend ready"
    );
    Ok(backend)
}
