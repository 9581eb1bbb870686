//! The generation seam between the QA processor and an LLM.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use paperfeed_common::PaperRecord;
use paperfeed_llm::{LlmBackend, LlmRequest, Message};

use crate::error::GenerationError;

/// The parts of a paper an answer may draw on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaperContext {
    pub title: String,
    pub abstract_text: String,
    pub authors: String,
}

impl From<&PaperRecord> for PaperContext {
    fn from(p: &PaperRecord) -> Self {
        Self {
            title: p.title.clone(),
            abstract_text: p.abstract_text.clone(),
            authors: p.authors.clone(),
        }
    }
}

/// Produces the answer to one question about one paper.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn answer(&self, paper: &PaperContext, question: &str) -> Result<String, GenerationError>;
}

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a research assistant helping a reader \
triage new arXiv papers. Answer the question using only the title, authors and abstract \
provided. Be concise, use Markdown for structure, and say so plainly when the abstract \
does not contain enough information.";

/// [`AnswerGenerator`] backed by any [`LlmBackend`].
pub struct LlmAnswerGenerator {
    backend: Arc<dyn LlmBackend>,
    system_prompt: String,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
    timeout: Option<Duration>,
}

impl LlmAnswerGenerator {
    pub fn new(backend: Arc<dyn LlmBackend>) -> Self {
        Self {
            backend,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            max_tokens: None,
            temperature: None,
            timeout: None,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Upper bound on one generation call, on top of the HTTP client's own.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build_request(&self, paper: &PaperContext, question: &str) -> LlmRequest {
        let user = format!(
            "Title: {}\nAuthors: {}\n\nAbstract:\n{}\n\nQuestion: {}",
            paper.title, paper.authors, paper.abstract_text, question
        );
        LlmRequest {
            messages: vec![Message::system(&self.system_prompt), Message::user(user)],
            model: None,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }
}

#[async_trait]
impl AnswerGenerator for LlmAnswerGenerator {
    async fn answer(&self, paper: &PaperContext, question: &str) -> Result<String, GenerationError> {
        let req = self.build_request(paper, question);
        let call = self.backend.complete(req);

        let resp = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| GenerationError::Timeout(limit))??,
            None => call.await?,
        };

        let content = resp.content.trim();
        if content.is_empty() {
            return Err(GenerationError::Malformed(format!(
                "empty completion from {}",
                resp.model
            )));
        }
        tracing::debug!(
            model = %resp.model,
            prompt_tokens = resp.prompt_tokens,
            completion_tokens = resp.completion_tokens,
            "answer generated"
        );
        Ok(content.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paperfeed_llm::{LlmError, LlmResponse, Role};

    struct FixedBackend(&'static str);

    #[async_trait]
    impl LlmBackend for FixedBackend {
        async fn complete(&self, _req: LlmRequest) -> Result<LlmResponse, LlmError> {
            Ok(LlmResponse {
                content: self.0.to_string(),
                model: "fixed".to_string(),
                prompt_tokens: 0,
                completion_tokens: 0,
            })
        }
        fn model_id(&self) -> &str { "fixed" }
        fn is_local(&self) -> bool { true }
    }

    struct HangingBackend;

    #[async_trait]
    impl LlmBackend for HangingBackend {
        async fn complete(&self, _req: LlmRequest) -> Result<LlmResponse, LlmError> {
            std::future::pending().await
        }
        fn model_id(&self) -> &str { "hang" }
        fn is_local(&self) -> bool { true }
    }

    fn ctx() -> PaperContext {
        PaperContext {
            title: "On Things".to_string(),
            abstract_text: "We study things.".to_string(),
            authors: "A. Author".to_string(),
        }
    }

    #[test]
    fn test_request_carries_paper_and_question() {
        let gen = LlmAnswerGenerator::new(Arc::new(FixedBackend("x"))).with_max_tokens(256);
        let req = gen.build_request(&ctx(), "What is new?");
        assert_eq!(req.messages.len(), 2);
        assert_eq!(req.messages[0].role, Role::System);
        let user = &req.messages[1].content;
        assert!(user.contains("Title: On Things"));
        assert!(user.contains("We study things."));
        assert!(user.contains("Question: What is new?"));
        assert_eq!(req.max_tokens, Some(256));
    }

    #[tokio::test]
    async fn test_answer_is_trimmed() {
        let gen = LlmAnswerGenerator::new(Arc::new(FixedBackend("  **Yes.**\n")));
        assert_eq!(gen.answer(&ctx(), "q").await.unwrap(), "**Yes.**");
    }

    #[tokio::test]
    async fn test_empty_answer_is_malformed() {
        let gen = LlmAnswerGenerator::new(Arc::new(FixedBackend("   ")));
        let err = gen.answer(&ctx(), "q").await.unwrap_err();
        assert!(matches!(err, GenerationError::Malformed(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_backend_times_out() {
        let gen = LlmAnswerGenerator::new(Arc::new(HangingBackend))
            .with_timeout(Duration::from_secs(30));
        let err = gen.answer(&ctx(), "q").await.unwrap_err();
        assert!(matches!(err, GenerationError::Timeout(_)));
    }
}
