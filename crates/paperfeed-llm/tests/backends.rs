//! Backends against a local stub server speaking each provider's wire format.
//!
//! Run with: cargo test --package paperfeed-llm --test backends

use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use paperfeed_llm::{
    AnthropicBackend, ChatCompletionsBackend, GeminiBackend, LlmBackend, LlmError, LlmRequest,
    Message,
};

/// One request as the stub saw it.
#[derive(Debug, Clone)]
struct Seen {
    path: String,
    headers: HeaderMap,
    body: Value,
}

#[derive(Clone)]
struct Stub {
    seen: Arc<Mutex<Vec<Seen>>>,
    status: StatusCode,
    reply: Value,
}

impl Stub {
    fn new(status: StatusCode, reply: Value) -> Self {
        Self { seen: Arc::new(Mutex::new(Vec::new())), status, reply }
    }

    fn last(&self) -> Seen {
        self.seen.lock().unwrap().last().cloned().expect("no request reached the stub")
    }
}

async fn record(stub: &Stub, path: String, headers: HeaderMap, body: Value) -> Response {
    stub.seen.lock().unwrap().push(Seen { path, headers, body });
    match &stub.reply {
        Value::String(text) => (stub.status, text.clone()).into_response(),
        other => (stub.status, Json(other.clone())).into_response(),
    }
}

async fn gemini_route(
    State(stub): State<Stub>,
    Path(call): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    record(&stub, call, headers, body).await
}

async fn fixed_route(State(stub): State<Stub>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    record(&stub, String::new(), headers, body).await
}

/// Serve `stub` on an ephemeral port and return its base URL.
async fn serve(stub: Stub) -> String {
    let app = Router::new()
        .route("/v1beta/models/{call}", post(gemini_route))
        .route("/v1/messages", post(fixed_route))
        .route("/v1/chat/completions", post(fixed_route))
        .with_state(stub);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn request() -> LlmRequest {
    LlmRequest {
        messages: vec![Message::system("You triage papers."), Message::user("What is new?")],
        max_tokens: Some(300),
        temperature: Some(0.1),
        ..Default::default()
    }
}

fn header<'a>(seen: &'a Seen, name: &str) -> Option<&'a str> {
    seen.headers.get(name).and_then(|v| v.to_str().ok())
}

// ── Gemini ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_gemini_complete() {
    let stub = Stub::new(
        StatusCode::OK,
        json!({
            "candidates": [{ "content": { "role": "model", "parts": [
                { "text": "A sparse " },
                { "text": "attention **variant**." }
            ]}}],
            "usageMetadata": { "promptTokenCount": 41, "candidatesTokenCount": 9 }
        }),
    );
    let base = serve(stub.clone()).await;
    let backend = GeminiBackend::new("AIza-test", "gemini-2.0-flash-exp").with_base_url(&base);

    let resp = backend.complete(request()).await.unwrap();
    assert_eq!(resp.content, "A sparse attention **variant**.");
    assert_eq!(resp.model, "gemini-2.0-flash-exp");
    assert_eq!((resp.prompt_tokens, resp.completion_tokens), (41, 9));

    let seen = stub.last();
    assert_eq!(seen.path, "gemini-2.0-flash-exp:generateContent");
    assert_eq!(header(&seen, "x-goog-api-key"), Some("AIza-test"));
    assert_eq!(seen.body["systemInstruction"]["parts"][0]["text"], "You triage papers.");
    assert_eq!(seen.body["contents"].as_array().map(Vec::len), Some(1));
    assert_eq!(seen.body["contents"][0]["parts"][0]["text"], "What is new?");
    assert_eq!(seen.body["generationConfig"]["maxOutputTokens"], 300);
}

#[tokio::test]
async fn test_gemini_request_model_override() {
    let stub = Stub::new(StatusCode::OK, json!({ "candidates": [] }));
    let base = serve(stub.clone()).await;
    let backend = GeminiBackend::new("k", "gemini-2.0-flash-exp").with_base_url(format!("{base}/"));

    let req = LlmRequest { model: Some("gemini-1.5-pro".to_string()), ..request() };
    let resp = backend.complete(req).await.unwrap();
    assert_eq!(resp.content, "");
    assert_eq!(resp.model, "gemini-1.5-pro");
    assert_eq!(stub.last().path, "gemini-1.5-pro:generateContent");
}

#[tokio::test]
async fn test_gemini_error_status() {
    let stub = Stub::new(
        StatusCode::TOO_MANY_REQUESTS,
        json!({ "error": { "code": 429, "message": "Resource has been exhausted" } }),
    );
    let base = serve(stub).await;
    let backend = GeminiBackend::new("k", "gemini-2.0-flash-exp").with_base_url(&base);

    match backend.complete(request()).await {
        Err(LlmError::ApiError { status, message }) => {
            assert_eq!(status, 429);
            assert_eq!(message, "Resource has been exhausted");
        }
        other => panic!("expected ApiError, got {other:?}"),
    }
}

// ── Anthropic ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_anthropic_complete() {
    let stub = Stub::new(
        StatusCode::OK,
        json!({
            "model": "claude-sonnet-4-5-20250929",
            "content": [
                { "type": "text", "text": "First. " },
                { "type": "tool_use", "id": "t1", "name": "noop", "input": {} },
                { "type": "text", "text": "Second." }
            ],
            "usage": { "input_tokens": 20, "output_tokens": 4 }
        }),
    );
    let base = serve(stub.clone()).await;
    let backend = AnthropicBackend::new("sk-ant-test", "claude-sonnet-4-5").with_base_url(&base);

    let resp = backend.complete(request()).await.unwrap();
    assert_eq!(resp.content, "First. Second.");
    assert_eq!(resp.model, "claude-sonnet-4-5-20250929");
    assert_eq!((resp.prompt_tokens, resp.completion_tokens), (20, 4));

    let seen = stub.last();
    assert_eq!(header(&seen, "x-api-key"), Some("sk-ant-test"));
    assert_eq!(header(&seen, "anthropic-version"), Some("2023-06-01"));
    assert_eq!(seen.body["system"], "You triage papers.");
    assert_eq!(seen.body["messages"], json!([{ "role": "user", "content": "What is new?" }]));
    assert_eq!(seen.body["model"], "claude-sonnet-4-5");
}

#[tokio::test]
async fn test_anthropic_top_level_error_message() {
    let stub = Stub::new(StatusCode::UNAUTHORIZED, json!({ "message": "invalid x-api-key" }));
    let base = serve(stub).await;
    let backend = AnthropicBackend::new("bad", "claude-sonnet-4-5").with_base_url(&base);

    let err = backend.complete(request()).await.unwrap_err();
    assert_eq!(err.to_string(), "API error [401]: invalid x-api-key");
}

// ── Chat Completions ──────────────────────────────────────────────────────────

fn chat_reply() -> Value {
    json!({
        "model": "served-model",
        "choices": [{ "message": { "role": "assistant", "content": "It is faster." } }],
        "usage": { "prompt_tokens": 15, "completion_tokens": 5 }
    })
}

#[tokio::test]
async fn test_chat_completions_with_key() {
    let stub = Stub::new(StatusCode::OK, chat_reply());
    let base = serve(stub.clone()).await;
    let backend = ChatCompletionsBackend::compatible(&base, "gpt-4o-mini", Some("sk-test".to_string()));

    let resp = backend.complete(request()).await.unwrap();
    assert_eq!(resp.content, "It is faster.");
    assert_eq!(resp.model, "served-model");
    assert_eq!((resp.prompt_tokens, resp.completion_tokens), (15, 5));

    let seen = stub.last();
    assert_eq!(header(&seen, "authorization"), Some("Bearer sk-test"));
    assert_eq!(seen.body["model"], "gpt-4o-mini");
    assert_eq!(seen.body["messages"][0]["role"], "system");
    assert_eq!(seen.body["messages"][1]["role"], "user");
}

#[tokio::test]
async fn test_ollama_sends_no_auth() {
    let stub = Stub::new(StatusCode::OK, chat_reply());
    let base = serve(stub.clone()).await;
    let backend = ChatCompletionsBackend::ollama(&base, "llama3:8b");

    backend.complete(request()).await.unwrap();
    assert_eq!(header(&stub.last(), "authorization"), None);
}

#[tokio::test]
async fn test_non_json_error_body_is_reported_verbatim() {
    let stub = Stub::new(StatusCode::BAD_GATEWAY, Value::String("upstream unavailable\n".to_string()));
    let base = serve(stub).await;
    let backend = ChatCompletionsBackend::ollama(&base, "llama3:8b");

    match backend.complete(request()).await {
        Err(LlmError::ApiError { status, message }) => {
            assert_eq!(status, 502);
            assert_eq!(message, "upstream unavailable");
        }
        other => panic!("expected ApiError, got {other:?}"),
    }
}
