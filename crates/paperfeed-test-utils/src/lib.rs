//! Shared fixtures for paperfeed tests: on-disk snapshot layouts and a
//! scripted answer generator.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use paperfeed_qa::{AnswerGenerator, GenerationError, PaperContext};
use serde_json::{json, Value};
use tempfile::TempDir;

// ── Records ───────────────────────────────────────────────────────────────────

/// A record in the current lowercase convention.
pub fn paper_json(id: &str, title: &str) -> Value {
    json!({
        "arxiv_id": id,
        "title": title,
        "abstract": format!("Abstract of {title}."),
        "authors": "Ada Lovelace, Alan Turing",
        "comment": "Matches criterion 1",
        "relevance": 9,
        "novelty": 7
    })
}

/// The same record in the legacy uppercase convention.
pub fn legacy_paper_json(id: &str, title: &str) -> Value {
    json!({
        "ARXIVID": id,
        "TITLE": title,
        "ABSTRACT": format!("Abstract of {title}."),
        "AUTHORS": "Ada Lovelace, Alan Turing",
        "COMMENT": "Matches criterion 1",
        "RELEVANCE": 9,
        "NOVELTY": 7
    })
}

/// Wrap records into a snapshot object keyed by position.
pub fn snapshot_json(records: &[Value]) -> Value {
    let map: serde_json::Map<String, Value> = records
        .iter()
        .enumerate()
        .map(|(i, r)| (format!("paper-{i}"), r.clone()))
        .collect();
    Value::Object(map)
}

// ── On-disk layout ────────────────────────────────────────────────────────────

/// A throwaway `out/` + `configs/` tree, removed on drop.
pub struct TestWorkspace {
    dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> anyhow::Result<Self> {
        let dir = TempDir::new()?;
        std::fs::create_dir_all(dir.path().join("out"))?;
        std::fs::create_dir_all(dir.path().join("configs"))?;
        Ok(Self { dir })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn live_path(&self) -> PathBuf {
        self.root().join("out").join("output.json")
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.root().join("out").join("cache")
    }

    pub fn header_path(&self) -> PathBuf {
        self.root().join("configs").join("header.md")
    }

    pub fn topics_path(&self) -> PathBuf {
        self.root().join("configs").join("paper_topics.txt")
    }

    pub fn write_live(&self, snapshot: &Value) -> anyhow::Result<()> {
        std::fs::write(self.live_path(), serde_json::to_vec_pretty(snapshot)?)?;
        Ok(())
    }

    /// Write an archive for `date` (`YYYY-MM-DD`).
    pub fn write_archive(&self, date: &str, snapshot: &Value) -> anyhow::Result<()> {
        self.write_cache_file(&format!("{date}_output.json"), &serde_json::to_vec(snapshot)?)
    }

    pub fn write_cache_file(&self, name: &str, bytes: &[u8]) -> anyhow::Result<()> {
        std::fs::create_dir_all(self.cache_dir())?;
        std::fs::write(self.cache_dir().join(name), bytes)?;
        Ok(())
    }

    pub fn write_header(&self, text: &str) -> anyhow::Result<()> {
        std::fs::write(self.header_path(), text)?;
        Ok(())
    }

    pub fn write_topics(&self, text: &str) -> anyhow::Result<()> {
        std::fs::write(self.topics_path(), text)?;
        Ok(())
    }

    /// Names of every file in the cache directory, sorted.
    pub fn cache_files(&self) -> anyhow::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(self.cache_dir())? {
            names.push(entry?.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }
}

// ── Scripted generator ────────────────────────────────────────────────────────

/// Deterministic [`AnswerGenerator`] that counts its calls.
#[derive(Default)]
pub struct ScriptedGenerator {
    fail_on: HashSet<String>,
    delay: Option<Duration>,
    total: AtomicUsize,
    per_question: Mutex<HashMap<String, usize>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call for `question` fails with a provider-style error.
    pub fn failing_on(mut self, question: impl Into<String>) -> Self {
        self.fail_on.insert(question.into());
        self
    }

    /// Sleep before answering, to widen race windows.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    pub fn calls_for(&self, question: &str) -> usize {
        let counts = self.per_question.lock().unwrap_or_else(|e| e.into_inner());
        counts.get(question).copied().unwrap_or(0)
    }

    pub fn answer_text(paper: &PaperContext, question: &str) -> String {
        format!("**{}**: answer to *{}*", paper.title, question)
    }
}

#[async_trait]
impl AnswerGenerator for ScriptedGenerator {
    async fn answer(&self, paper: &PaperContext, question: &str) -> Result<String, GenerationError> {
        self.total.fetch_add(1, Ordering::SeqCst);
        {
            let mut counts = self.per_question.lock().unwrap_or_else(|e| e.into_inner());
            *counts.entry(question.to_string()).or_insert(0) += 1;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_on.contains(question) {
            return Err(GenerationError::Malformed(format!("scripted failure for '{question}'")));
        }
        Ok(Self::answer_text(paper, question))
    }
}
