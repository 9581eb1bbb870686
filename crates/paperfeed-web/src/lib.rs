//! paperfeed-web: Web front end for the daily paper feed.
//! Provides:
//!   - The daily paper listing, with a picker for archived dates
//!   - An archive history grouped by month
//!   - On-demand Q&A about a paper, with progress polling

pub mod error;
pub mod handlers;
pub mod render;
pub mod router;
pub mod state;
pub mod templates;
