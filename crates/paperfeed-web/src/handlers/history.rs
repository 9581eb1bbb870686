//! Archive history grouped by month.

use axum::{extract::State, response::Html};
use chrono::Local;
use minijinja::context;
use serde::Serialize;

use paperfeed_store::date_index::DATE_FORMAT;
use paperfeed_store::SnapshotCache;

use crate::error::{PageError, WebError};
use crate::state::SharedState;
use crate::templates;

const MONTH_FORMAT: &str = "%B %Y";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryDay {
    pub date: String,
    pub display_date: String,
    pub paper_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryMonth {
    /// e.g. "January 2024"
    pub month: String,
    pub days: Vec<HistoryDay>,
}

/// GET /history
pub async fn history(State(state): State<SharedState>) -> Result<Html<String>, PageError> {
    let render = async {
        let months = build_history(&state.cache).await?;
        state.render(
            templates::HISTORY,
            context! {
                months => months,
                current_date => Local::now().date_naive().format(DATE_FORMAT).to_string(),
            },
        )
    };
    render.await.map(Html).map_err(|e| PageError::new("history", e))
}

/// Paper counts for every archived date, newest month first and newest
/// day first within a month. An archive that cannot be read counts as zero.
pub async fn build_history(cache: &SnapshotCache) -> Result<Vec<HistoryMonth>, WebError> {
    let index = cache.list_dates().await?;
    let mut months: Vec<HistoryMonth> = Vec::new();

    for entry in &index {
        let paper_count = match cache.count_papers(entry.date).await {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!(date = %entry.key, error = %e, "unreadable archive counted as empty");
                0
            }
        };
        let day = HistoryDay {
            date: entry.key.clone(),
            display_date: entry.display.clone(),
            paper_count,
        };

        let month = entry.date.format(MONTH_FORMAT).to_string();
        match months.last_mut() {
            Some(current) if current.month == month => current.days.push(day),
            _ => months.push(HistoryMonth { month, days: vec![day] }),
        }
    }
    Ok(months)
}
