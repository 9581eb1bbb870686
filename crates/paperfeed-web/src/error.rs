//! Web-layer errors and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use paperfeed_common::PaperError;
use paperfeed_qa::QaError;
use paperfeed_store::StoreError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WebError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Invalid paper record: {0}")]
    Paper(#[from] PaperError),

    #[error("Failed to read {path}: {source}")]
    Document {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("Paper not found")]
    PaperNotFound(String),

    #[error(transparent)]
    Qa(#[from] QaError),
}

/// Full-page failure. Rendered as a plain 500; pages are never partial.
#[derive(Debug)]
pub struct PageError {
    what: &'static str,
    source: WebError,
}

impl PageError {
    pub fn new(what: &'static str, source: WebError) -> Self {
        tracing::error!(page = what, error = %source, "page failed to render");
        Self { what, source }
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Error loading {}: {}", self.what, self.source),
        )
            .into_response()
    }
}
