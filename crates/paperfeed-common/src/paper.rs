//! Canonical paper record and normalisation of raw snapshot entries.
//!
//! Snapshot files have been written under two field-naming conventions over
//! time: the current lowercase one (`arxiv_id`, `title`, ...) and a legacy
//! uppercase one (`ARXIVID`, `TITLE`, ...). Every logical field is resolved
//! through an ordered list of keys; the first key holding a usable value wins.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{PaperError, Result};

/// Base URL every paper link is derived from.
pub const ARXIV_ABS_BASE: &str = "https://arxiv.org/abs/";

/// Ordered lookup keys for each logical field, current convention first.
pub mod keys {
    pub const ID: &[&str]        = &["arxiv_id", "ARXIVID"];
    pub const TITLE: &[&str]     = &["title", "TITLE"];
    pub const ABSTRACT: &[&str]  = &["abstract", "ABSTRACT"];
    pub const AUTHORS: &[&str]   = &["authors", "AUTHORS"];
    pub const COMMENT: &[&str]   = &["comment", "COMMENT"];
    pub const RELEVANCE: &[&str] = &["relevance", "RELEVANCE"];
    pub const NOVELTY: &[&str]   = &["novelty", "NOVELTY"];
}

/// One paper, normalised from either naming convention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperRecord {
    pub id: String,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub authors: String,
    pub url: String,
    pub comment: Option<String>,
    pub relevance: Option<String>,
    pub novelty: Option<String>,
}

impl PaperRecord {
    /// Normalise a raw snapshot entry into the canonical shape.
    pub fn normalize(raw: &Value) -> Result<Self> {
        if !raw.is_object() {
            return Err(PaperError::NotAnObject);
        }

        let id = required(raw, keys::ID, "id")?;
        Ok(Self {
            url: Self::url_for(&id),
            title: required(raw, keys::TITLE, "title")?,
            abstract_text: required(raw, keys::ABSTRACT, "abstract")?,
            authors: required(raw, keys::AUTHORS, "authors")?,
            comment: resolve_text(raw, keys::COMMENT),
            relevance: resolve_text(raw, keys::RELEVANCE),
            novelty: resolve_text(raw, keys::NOVELTY),
            id,
        })
    }

    /// The abstract page for an arXiv id. Never taken from input.
    pub fn url_for(id: &str) -> String {
        format!("{ARXIV_ABS_BASE}{id}")
    }
}

/// Return the first value under `keys` that is present and non-empty.
///
/// `null` and empty strings count as absent so that a blank current-convention
/// field falls through to the legacy one.
pub fn resolve_field<'a>(raw: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| raw.get(*k))
        .find(|v| match v {
            Value::Null => false,
            Value::String(s) => !s.trim().is_empty(),
            _ => true,
        })
}

/// Resolve a field and coerce it to display text.
pub fn resolve_text(raw: &Value, keys: &[&str]) -> Option<String> {
    resolve_field(raw, keys).and_then(value_to_text)
}

fn required(raw: &Value, keys: &[&str], field: &'static str) -> Result<String> {
    resolve_text(raw, keys).ok_or(PaperError::MissingField(field))
}

fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        // Author lists are occasionally stored as arrays
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(value_to_text).collect();
            if parts.is_empty() { None } else { Some(parts.join(", ")) }
        }
        Value::Object(_) => None,
    }
}

/// Normalise every record, failing on the first invalid one.
pub fn normalize_all<'a, I>(records: I) -> Result<Vec<PaperRecord>>
where
    I: IntoIterator<Item = &'a Value>,
{
    records.into_iter().map(PaperRecord::normalize).collect()
}

/// Locate the paper with `id`.
///
/// Records whose id does not match, or has no usable id at all, are skipped.
/// A record that matches `id` but fails normalisation is an error, not a miss.
pub fn find_by_id<'a, I>(records: I, id: &str) -> Result<Option<PaperRecord>>
where
    I: IntoIterator<Item = &'a Value>,
{
    for raw in records {
        match resolve_text(raw, keys::ID) {
            Some(candidate) if candidate == id => return PaperRecord::normalize(raw).map(Some),
            Some(_) => {}
            None => tracing::debug!("skipping record without an id during lookup"),
        }
    }
    Ok(None)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
