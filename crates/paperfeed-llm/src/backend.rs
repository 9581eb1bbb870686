//! LLM backend trait and the HTTP providers behind it.
//!
//! Three wire formats are spoken:
//!   GeminiBackend          - `generateContent` (Google Gemini)
//!   AnthropicBackend       - Messages API (claude-*)
//!   ChatCompletionsBackend - `/v1/chat/completions`, shared by OpenAI,
//!                            OpenAI-compatible servers and Ollama

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const OLLAMA_BASE_URL: &str = "http://localhost:11434";

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 2048;
const DEFAULT_TEMPERATURE: f32 = 0.2;

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
    #[error("API error [{status}]: {message}")]
    ApiError { status: u16, message: String },
}

// ── Request / Response ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmRequest {
    pub messages: Vec<Message>,
    /// Overrides the backend's configured model for this call.
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl LlmRequest {
    /// System messages joined into one instruction, if any.
    fn system_text(&self) -> Option<String> {
        let parts: Vec<&str> = self
            .messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect();
        (!parts.is_empty()).then(|| parts.join("\n\n"))
    }

    fn conversation(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(|m| m.role != Role::System)
    }

    fn max_tokens(&self) -> u32 {
        self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)
    }

    fn temperature(&self) -> f32 {
        self.temperature.unwrap_or(DEFAULT_TEMPERATURE)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub content: String,
    pub model: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

// ── Trait ─────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait LlmBackend: Send + Sync {
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError>;
    fn model_id(&self) -> &str;
    fn is_local(&self) -> bool;
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Read the body as JSON, turning any 4xx/5xx into [`LlmError::ApiError`].
/// Error bodies that are not JSON are reported verbatim.
async fn read_json(resp: reqwest::Response) -> Result<Value, LlmError> {
    let status = resp.status();
    let text = resp.text().await?;

    if status.is_client_error() || status.is_server_error() {
        let parsed: Option<Value> = serde_json::from_str(&text).ok();
        let message = parsed
            .as_ref()
            .and_then(|b| b["error"]["message"].as_str().or_else(|| b["message"].as_str()))
            .map(str::to_string)
            .unwrap_or_else(|| text.trim().to_string());
        return Err(LlmError::ApiError { status: status.as_u16(), message });
    }
    Ok(serde_json::from_str(&text)?)
}

fn token_count(v: &Value) -> u32 {
    v.as_u64().map_or(0, |n| u32::try_from(n).unwrap_or(u32::MAX))
}

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

// ── Google Gemini ─────────────────────────────────────────────────────────────

pub struct GeminiBackend {
    pub model: String,
    pub base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl GeminiBackend {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: GEMINI_BASE_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    fn body(req: &LlmRequest) -> Value {
        let contents: Vec<Value> = req
            .conversation()
            .map(|m| {
                let role = if m.role == Role::Assistant { "model" } else { "user" };
                json!({ "role": role, "parts": [{ "text": m.content }] })
            })
            .collect();

        let mut body = json!({
            "contents": contents,
            "generationConfig": {
                "maxOutputTokens": req.max_tokens(),
                "temperature": req.temperature(),
            }
        });
        if let Some(system) = req.system_text() {
            body["systemInstruction"] = json!({ "parts": [{ "text": system }] });
        }
        body
    }
}

#[async_trait]
impl LlmBackend for GeminiBackend {
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError> {
        let model = req.model.as_deref().unwrap_or(&self.model);
        let url = endpoint(&self.base_url, &format!("/v1beta/models/{model}:generateContent"));

        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::body(&req))
            .send()
            .await?;
        let json = read_json(resp).await?;

        // Text may be split across several parts of the first candidate
        let content = json["candidates"][0]["content"]["parts"]
            .as_array()
            .map(|parts| parts.iter().filter_map(|p| p["text"].as_str()).collect::<String>())
            .unwrap_or_default();

        Ok(LlmResponse {
            content,
            model: json["modelVersion"].as_str().unwrap_or(model).to_string(),
            prompt_tokens: token_count(&json["usageMetadata"]["promptTokenCount"]),
            completion_tokens: token_count(&json["usageMetadata"]["candidatesTokenCount"]),
        })
    }

    fn model_id(&self) -> &str { &self.model }
    fn is_local(&self) -> bool { false }
}

// ── Anthropic ─────────────────────────────────────────────────────────────────

pub struct AnthropicBackend {
    pub model: String,
    pub base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl AnthropicBackend {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: ANTHROPIC_BASE_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    fn body(req: &LlmRequest, model: &str) -> Value {
        let messages: Vec<&Message> = req.conversation().collect();
        let mut body = json!({
            "model": model,
            "messages": messages,
            "max_tokens": req.max_tokens(),
            "temperature": req.temperature(),
        });
        if let Some(system) = req.system_text() {
            body["system"] = Value::String(system);
        }
        body
    }
}

#[async_trait]
impl LlmBackend for AnthropicBackend {
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError> {
        let model = req.model.as_deref().unwrap_or(&self.model);
        let resp = self
            .client
            .post(endpoint(&self.base_url, "/v1/messages"))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&Self::body(&req, model))
            .send()
            .await?;
        let json = read_json(resp).await?;

        let content = json["content"]
            .as_array()
            .map(|blocks| {
                blocks
                    .iter()
                    .filter(|b| b["type"] == "text")
                    .filter_map(|b| b["text"].as_str())
                    .collect::<String>()
            })
            .unwrap_or_default();

        Ok(LlmResponse {
            content,
            model: json["model"].as_str().unwrap_or(model).to_string(),
            prompt_tokens: token_count(&json["usage"]["input_tokens"]),
            completion_tokens: token_count(&json["usage"]["output_tokens"]),
        })
    }

    fn model_id(&self) -> &str { &self.model }
    fn is_local(&self) -> bool { false }
}

// ── Chat Completions (OpenAI, compatible servers, Ollama) ─────────────────────

pub struct ChatCompletionsBackend {
    pub model: String,
    pub base_url: String,
    api_key: Option<String>,
    local: bool,
    client: reqwest::Client,
}

impl ChatCompletionsBackend {
    /// api.openai.com with a bearer key.
    pub fn openai(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::compatible(OPENAI_BASE_URL, model, Some(api_key.into()))
    }

    /// Any server speaking the OpenAI wire format (LMStudio, vLLM, Groq, ...).
    /// The key is optional for self-hosted servers.
    pub fn compatible(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            model: model.into(),
            base_url: base_url.into(),
            api_key,
            local: false,
            client: reqwest::Client::new(),
        }
    }

    /// A local Ollama daemon through its OpenAI-compatible endpoint.
    pub fn ollama(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self { local: true, ..Self::compatible(base_url, model, None) }
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    fn body(req: &LlmRequest, model: &str) -> Value {
        json!({
            "model": model,
            "messages": req.messages,
            "max_tokens": req.max_tokens(),
            "temperature": req.temperature(),
        })
    }
}

#[async_trait]
impl LlmBackend for ChatCompletionsBackend {
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError> {
        let model = req.model.as_deref().unwrap_or(&self.model);
        let mut call = self
            .client
            .post(endpoint(&self.base_url, "/v1/chat/completions"))
            .json(&Self::body(&req, model));
        if let Some(key) = &self.api_key {
            call = call.bearer_auth(key);
        }
        let json = read_json(call.send().await?).await?;

        Ok(LlmResponse {
            content: json["choices"][0]["message"]["content"].as_str().unwrap_or_default().to_string(),
            model: json["model"].as_str().unwrap_or(model).to_string(),
            prompt_tokens: token_count(&json["usage"]["prompt_tokens"]),
            completion_tokens: token_count(&json["usage"]["completion_tokens"]),
        })
    }

    fn model_id(&self) -> &str { &self.model }
    fn is_local(&self) -> bool { self.local }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
