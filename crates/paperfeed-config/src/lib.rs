//! Configuration loading for paperfeed.
//! Reads paperfeed.toml from the current directory or the path in the
//! PAPERFEED_CONFIG env var. Every setting has a default, so a missing
//! default file is not an error.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_ENV_VAR: &str = "PAPERFEED_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "paperfeed.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub qa: QaConfig,
}

// ── [server] ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16    { 5000 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port() }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// ── [paths] ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Snapshot written by the ingestion process.
    #[serde(default = "default_live_snapshot")]
    pub live_snapshot: PathBuf,
    /// Directory of `YYYY-MM-DD_output.json` archives.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    #[serde(default = "default_header")]
    pub header: PathBuf,
    #[serde(default = "default_topics")]
    pub topics: PathBuf,
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

fn default_live_snapshot() -> PathBuf { PathBuf::from("out/output.json") }
fn default_cache_dir()     -> PathBuf { PathBuf::from("out/cache") }
fn default_header()        -> PathBuf { PathBuf::from("configs/header.md") }
fn default_topics()        -> PathBuf { PathBuf::from("configs/paper_topics.txt") }
fn default_static_dir()    -> PathBuf { PathBuf::from("static") }

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            live_snapshot: default_live_snapshot(),
            cache_dir: default_cache_dir(),
            header: default_header(),
            topics: default_topics(),
            static_dir: default_static_dir(),
        }
    }
}

// ── [llm] ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// gemini | openai | openai_compatible | anthropic | ollama
    #[serde(default = "default_backend")]
    pub backend: String,
    #[serde(default = "default_model")]
    pub model: String,
    pub base_url: Option<String>,
    /// Prefer the environment over committing a key here.
    pub api_key: Option<String>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_backend()      -> String { "gemini".to_string() }
fn default_model()        -> String { "gemini-2.0-flash-exp".to_string() }
fn default_max_tokens()   -> u32    { 1024 }
fn default_temperature()  -> f32    { 0.2 }
fn default_timeout_secs() -> u64    { 120 }

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            model: default_model(),
            base_url: None,
            api_key: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl LlmConfig {
    /// API key from the config file, then `PAPERFEED_<BACKEND>_API_KEY`,
    /// then the provider's conventional variable. The key is not validated.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.resolve_api_key_with(|name| std::env::var(name).ok())
    }

    pub fn resolve_api_key_with<F>(&self, lookup: F) -> Option<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |v: Option<String>| v.filter(|k| !k.trim().is_empty());

        if let Some(key) = non_empty(self.api_key.clone()) {
            return Some(key);
        }
        let backend = self.backend.trim().to_ascii_uppercase().replace('-', "_");
        if let Some(key) = non_empty(lookup(&format!("PAPERFEED_{backend}_API_KEY"))) {
            return Some(key);
        }
        let conventional = match backend.as_str() {
            "GEMINI" | "GOOGLE"     => "GEMINI_API_KEY",
            "OPENAI"                => "OPENAI_API_KEY",
            "ANTHROPIC" | "CLAUDE"  => "ANTHROPIC_API_KEY",
            _ => return None,
        };
        non_empty(lookup(conventional))
    }
}

// ── [qa] ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaConfig {
    /// Asked about every paper, in this order.
    #[serde(default = "default_questions")]
    pub questions: Vec<String>,
    /// Overrides the built-in system prompt when set.
    pub system_prompt: Option<String>,
}

fn default_questions() -> Vec<String> {
    [
        "What problem does this paper address, and why does it matter?",
        "What is the key idea or method proposed?",
        "How is the approach evaluated, and what are the main results?",
        "What are the limitations or open questions left by this work?",
    ]
    .iter()
    .map(|q| q.to_string())
    .collect()
}

impl Default for QaConfig {
    fn default() -> Self {
        Self { questions: default_questions(), system_prompt: None }
    }
}

mod tests;

impl Config {
    /// Load configuration.
    ///
    /// With PAPERFEED_CONFIG set, that file must exist. Otherwise
    /// `./paperfeed.toml` is read when present and defaults are used when not.
    pub fn load() -> Result<Self, ConfigError> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) => Self::from_path(path),
            Err(_) => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::from_path(path)
                } else {
                    tracing::info!("{} not found, using built-in defaults", DEFAULT_CONFIG_FILE);
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        tracing::info!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm.timeout_secs == 0 {
            return Err(ConfigError::Invalid("llm.timeout_secs must be greater than 0".to_string()));
        }
        if self.llm.model.trim().is_empty() {
            return Err(ConfigError::Invalid("llm.model must not be empty".to_string()));
        }
        if self.qa.questions.iter().any(|q| q.trim().is_empty()) {
            return Err(ConfigError::Invalid("qa.questions must not contain blank entries".to_string()));
        }
        if self.qa.questions.is_empty() {
            tracing::warn!("qa.questions is empty; Q&A requests will return no content");
        }
        Ok(())
    }
}
