//! Q&A endpoints. Both always answer 200; failures travel in the body.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use paperfeed_qa::QaProgress;

use crate::error::WebError;
use crate::render::render_qa;
use crate::state::SharedState;

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum QaResponse {
    Content { content: String },
    Error { error: String },
}

/// GET /qa_progress/{id}
pub async fn qa_progress(
    State(state): State<SharedState>,
    Path(paper_id): Path<String>,
) -> Json<QaProgress> {
    Json(state.qa.get_progress(&paper_id).await)
}

/// GET /get_qa/{id}
pub async fn get_qa(
    State(state): State<SharedState>,
    Path(paper_id): Path<String>,
) -> Json<QaResponse> {
    match answer(&state, &paper_id).await {
        Ok(content) => Json(QaResponse::Content { content }),
        Err(e) => {
            tracing::warn!(paper_id = %paper_id, error = %e, "Q&A request failed");
            Json(QaResponse::Error { error: e.to_string() })
        }
    }
}

/// Q&A always targets the live snapshot.
async fn answer(state: &SharedState, paper_id: &str) -> Result<String, WebError> {
    let snapshot = state.cache.load_live().await?;
    let paper = snapshot
        .find(paper_id)?
        .ok_or_else(|| WebError::PaperNotFound(paper_id.to_string()))?;

    let pairs = state.qa.process_qa(&paper).await?;
    Ok(render_qa(&pairs))
}
