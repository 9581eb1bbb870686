//! Shared application state for the web server.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use minijinja::Environment;
use paperfeed_config::Config;
use paperfeed_llm::{build_backend, BackendConfig, BackendKind, LlmError};
use paperfeed_qa::{AnswerGenerator, GenerationError, LlmAnswerGenerator, PaperContext, QaProcessor};
use paperfeed_store::SnapshotCache;

use crate::error::WebError;
use crate::templates;

/// Shared state injected into every Axum handler.
pub struct AppState {
    pub cache: SnapshotCache,
    pub qa: Arc<QaProcessor>,
    pub header_path: PathBuf,
    pub topics_path: PathBuf,
    pub static_dir: PathBuf,
    templates: Environment<'static>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(
        cache: SnapshotCache,
        qa: Arc<QaProcessor>,
        header_path: impl Into<PathBuf>,
        topics_path: impl Into<PathBuf>,
        static_dir: impl Into<PathBuf>,
    ) -> Result<Self, WebError> {
        Ok(Self {
            cache,
            qa,
            header_path: header_path.into(),
            topics_path: topics_path.into(),
            static_dir: static_dir.into(),
            templates: templates::environment()?,
        })
    }

    /// Wire up the cache, LLM backend and QA processor from configuration.
    ///
    /// A backend that cannot be built (unknown kind, missing key) does not
    /// stop the server: listings still work and every Q&A request reports
    /// the configuration problem instead.
    pub fn from_config(config: &Config) -> Result<Self, WebError> {
        let cache = SnapshotCache::new(&config.paths.live_snapshot, &config.paths.cache_dir);
        let generator = build_generator(config);
        let qa = Arc::new(QaProcessor::new(generator, config.qa.questions.clone()));

        Self::new(
            cache,
            qa,
            &config.paths.header,
            &config.paths.topics,
            &config.paths.static_dir,
        )
    }

    pub fn render(&self, name: &str, ctx: minijinja::Value) -> Result<String, WebError> {
        Ok(self.templates.get_template(name)?.render(ctx)?)
    }
}

fn build_generator(config: &Config) -> Arc<dyn AnswerGenerator> {
    build_generator_with(config, |name| std::env::var(name).ok())
}

/// As [`build_generator`], resolving the API key through `lookup`.
fn build_generator_with<F>(config: &Config, lookup: F) -> Arc<dyn AnswerGenerator>
where
    F: Fn(&str) -> Option<String>,
{
    let llm = &config.llm;
    let api_key = llm.resolve_api_key_with(lookup);
    let built = llm.backend.parse::<BackendKind>().and_then(|kind| {
        build_backend(&BackendConfig {
            kind,
            model: llm.model.clone(),
            api_key,
            base_url: llm.base_url.clone(),
            timeout: Duration::from_secs(llm.timeout_secs),
        })
    });

    match built {
        Ok(backend) => {
            let mut generator = LlmAnswerGenerator::new(backend)
                .with_max_tokens(llm.max_tokens)
                .with_temperature(llm.temperature)
                .with_timeout(Duration::from_secs(llm.timeout_secs));
            if let Some(prompt) = &config.qa.system_prompt {
                generator = generator.with_system_prompt(prompt);
            }
            Arc::new(generator)
        }
        Err(e) => {
            tracing::warn!(error = %e, "LLM backend unavailable; Q&A requests will fail");
            Arc::new(UnavailableGenerator(e.to_string()))
        }
    }
}

/// Stand-in used when no backend could be configured.
struct UnavailableGenerator(String);

#[async_trait]
impl AnswerGenerator for UnavailableGenerator {
    async fn answer(&self, _paper: &PaperContext, _question: &str) -> Result<String, GenerationError> {
        Err(GenerationError::Provider(LlmError::Unavailable(self.0.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_key_yields_failing_generator() {
        let mut config = Config::default();
        config.llm.backend = "anthropic".to_string();
        config.llm.api_key = None;
        let generator = build_generator_with(&config, |_| None);
        let ctx = PaperContext {
            title: "t".into(),
            abstract_text: "a".into(),
            authors: "x".into(),
        };
        let err = generator.answer(&ctx, "q").await.unwrap_err();
        assert!(matches!(err, GenerationError::Provider(LlmError::Unavailable(_))));
    }

    #[test]
    fn test_from_config_builds_state() {
        let state = AppState::from_config(&Config::default()).unwrap();
        assert_eq!(state.qa.questions().len(), 4);
        assert_eq!(state.static_dir, PathBuf::from("static"));
    }
}
