//! Daily listing, the landing page.

use std::path::Path;

use axum::{
    extract::{Query, State},
    response::Html,
};
use chrono::{Local, NaiveDate};
use minijinja::context;
use serde::Deserialize;

use paperfeed_store::date_index::{display_date, DATE_FORMAT};
use paperfeed_store::{parse_date_param, SnapshotSource};

use crate::error::{PageError, WebError};
use crate::render::render_markdown;
use crate::state::SharedState;
use crate::templates;

#[derive(Debug, Deserialize, Default)]
pub struct IndexQuery {
    pub date: Option<String>,
}

/// GET /?date=YYYY-MM-DD
pub async fn index(
    State(state): State<SharedState>,
    Query(query): Query<IndexQuery>,
) -> Result<Html<String>, PageError> {
    let today = Local::now().date_naive();
    render_index(&state, query.date.as_deref(), today)
        .await
        .map(Html)
        .map_err(|e| PageError::new("papers", e))
}

/// Build the listing for `date_param`, treating `today` as the live date.
///
/// An archived date shows that archive; anything else (no parameter, an
/// unparseable one, or a date with no archive) shows the live snapshot.
pub async fn render_index(
    state: &SharedState,
    date_param: Option<&str>,
    today: NaiveDate,
) -> Result<String, WebError> {
    state.cache.ensure_cached_for(today).await?;

    let available_dates = state.cache.list_dates().await?;
    let requested = date_param
        .and_then(parse_date_param)
        .filter(|d| available_dates.contains(*d));

    let snapshot = state.cache.load(requested).await?;
    let shown = match snapshot.source {
        SnapshotSource::Archive(date) => date,
        SnapshotSource::Live => today,
    };
    let papers = snapshot.papers()?;

    let header_content = render_markdown(&read_document(&state.header_path).await?);
    let topics_content = render_markdown(&read_document(&state.topics_path).await?);

    tracing::debug!(papers = papers.len(), date = %shown, "rendering listing");

    state.render(
        templates::INDEX,
        context! {
            papers => papers,
            date => display_date(shown),
            header_content => header_content,
            topics_content => topics_content,
            available_dates => available_dates,
            current_date => shown.format(DATE_FORMAT).to_string(),
        },
    )
}

async fn read_document(path: &Path) -> Result<String, WebError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| WebError::Document { path: path.to_path_buf(), source })
}
