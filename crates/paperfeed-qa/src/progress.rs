//! Per-paper QA progress as reported to pollers.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QaStatus {
    NotStarted,
    InProgress,
    Complete,
    Failed,
}

impl QaStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QaStatus::NotStarted => "not_started",
            QaStatus::InProgress => "in_progress",
            QaStatus::Complete   => "complete",
            QaStatus::Failed     => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
}

/// Point-in-time copy of one paper's QA state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QaProgress {
    pub paper_id: String,
    pub status: QaStatus,
    pub answered: usize,
    pub total: usize,
    /// Question currently being generated, if any.
    pub current_question: Option<String>,
    pub failed_question: Option<String>,
    pub error: Option<String>,
    /// Answers recorded so far, in question order.
    pub answers: Vec<QaPair>,
}

impl QaProgress {
    pub fn not_started(paper_id: &str, total: usize) -> Self {
        Self {
            paper_id: paper_id.to_string(),
            status: QaStatus::NotStarted,
            answered: 0,
            total,
            current_question: None,
            failed_question: None,
            error: None,
            answers: Vec::new(),
        }
    }

    pub fn answer_for(&self, question: &str) -> Option<&str> {
        self.answers
            .iter()
            .find(|p| p.question == question)
            .map(|p| p.answer.as_str())
    }
}
