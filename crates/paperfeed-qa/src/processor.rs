//! QA processor: runs the question list for a paper and tracks progress.
//!
//! Locking:
//!   - `slots` maps paper id → slot; held only to look up or insert.
//!   - `PaperSlot::run` serialises processing for one paper and is held
//!     across generation calls. Papers never wait on each other.
//!   - `PaperSlot::state` guards the recorded answers; held only for reads
//!     and updates, never across a generation call, so progress polls
//!     answer immediately.
//!
//! A second caller for a paper that is already being processed waits on
//! `run`, then finds the answers recorded by the first caller and only
//! generates whatever is still missing.

use std::collections::HashMap;
use std::sync::Arc;

use paperfeed_common::PaperRecord;
use tokio::sync::Mutex;

use crate::error::QaError;
use crate::generator::{AnswerGenerator, PaperContext};
use crate::progress::{QaPair, QaProgress, QaStatus};

#[derive(Debug)]
struct SlotState {
    status: QaStatus,
    answers: HashMap<String, String>,
    current_question: Option<String>,
    failed_question: Option<String>,
    error: Option<String>,
}

impl Default for SlotState {
    fn default() -> Self {
        Self {
            status: QaStatus::NotStarted,
            answers: HashMap::new(),
            current_question: None,
            failed_question: None,
            error: None,
        }
    }
}

#[derive(Debug, Default)]
struct PaperSlot {
    run: Mutex<()>,
    state: Mutex<SlotState>,
}

pub struct QaProcessor {
    generator: Arc<dyn AnswerGenerator>,
    questions: Arc<[String]>,
    slots: Mutex<HashMap<String, Arc<PaperSlot>>>,
}

impl QaProcessor {
    pub fn new(generator: Arc<dyn AnswerGenerator>, questions: Vec<String>) -> Self {
        Self {
            generator,
            questions: questions.into(),
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn questions(&self) -> &[String] {
        &self.questions
    }

    /// Current progress for `paper_id`. Unknown ids report `not_started`;
    /// querying never creates state.
    pub async fn get_progress(&self, paper_id: &str) -> QaProgress {
        let slot = self.slots.lock().await.get(paper_id).cloned();
        let Some(slot) = slot else {
            return QaProgress::not_started(paper_id, self.questions.len());
        };

        let state = slot.state.lock().await;
        let answers: Vec<QaPair> = self
            .questions
            .iter()
            .filter_map(|q| {
                state.answers.get(q).map(|a| QaPair { question: q.clone(), answer: a.clone() })
            })
            .collect();

        QaProgress {
            paper_id: paper_id.to_string(),
            status: state.status,
            answered: answers.len(),
            total: self.questions.len(),
            current_question: state.current_question.clone(),
            failed_question: state.failed_question.clone(),
            error: state.error.clone(),
            answers,
        }
    }

    /// Answer every configured question for `paper`, in order.
    ///
    /// Answers already recorded are reused; only missing ones are generated.
    /// On the first generation failure the paper is marked `failed`, the
    /// remaining questions are skipped and the failing question is returned
    /// in the error. Answers recorded before the failure are kept, and a
    /// later call resumes from the first unanswered question.
    ///
    /// The run itself executes on its own task: dropping the returned future
    /// (a client hanging up mid-request) does not interrupt generation, and
    /// the paper still ends `complete` or `failed`.
    pub async fn process_qa(&self, paper: &PaperRecord) -> Result<Vec<QaPair>, QaError> {
        let slot = self.slot_for(&paper.id).await;
        let run = PaperRun {
            slot: Arc::clone(&slot),
            generator: Arc::clone(&self.generator),
            questions: Arc::clone(&self.questions),
            paper_id: paper.id.clone(),
            context: PaperContext::from(paper),
        };

        match tokio::spawn(run.execute()).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(paper_id = %paper.id, error = %e, "Q&A task did not finish");
                let mut state = slot.state.lock().await;
                state.status = QaStatus::Failed;
                state.failed_question = state.current_question.take();
                state.error = Some(e.to_string());
                Err(QaError::Interrupted { paper_id: paper.id.clone(), reason: e.to_string() })
            }
        }
    }

    async fn slot_for(&self, paper_id: &str) -> Arc<PaperSlot> {
        let mut slots = self.slots.lock().await;
        slots.entry(paper_id.to_string()).or_default().clone()
    }
}

/// One paper's pass over the question list. Owns everything it touches so
/// it can run detached from the request that started it.
struct PaperRun {
    slot: Arc<PaperSlot>,
    generator: Arc<dyn AnswerGenerator>,
    questions: Arc<[String]>,
    paper_id: String,
    context: PaperContext,
}

impl PaperRun {
    async fn execute(self) -> Result<Vec<QaPair>, QaError> {
        let _running = self.slot.run.lock().await;
        let mut results = Vec::with_capacity(self.questions.len());

        for question in self.questions.iter() {
            let recorded = {
                let mut state = self.slot.state.lock().await;
                match state.answers.get(question) {
                    Some(answer) => Some(answer.clone()),
                    None => {
                        state.status = QaStatus::InProgress;
                        state.current_question = Some(question.clone());
                        state.failed_question = None;
                        state.error = None;
                        None
                    }
                }
            };
            if let Some(answer) = recorded {
                results.push(QaPair { question: question.clone(), answer });
                continue;
            }

            tracing::info!(paper_id = %self.paper_id, question = %question, "generating answer");
            match self.generator.answer(&self.context, question).await {
                Ok(answer) => {
                    let mut state = self.slot.state.lock().await;
                    state.answers.insert(question.clone(), answer.clone());
                    state.current_question = None;
                    results.push(QaPair { question: question.clone(), answer });
                }
                Err(e) => {
                    tracing::error!(paper_id = %self.paper_id, question = %question, error = %e, "answer generation failed");
                    let mut state = self.slot.state.lock().await;
                    state.status = QaStatus::Failed;
                    state.current_question = None;
                    state.failed_question = Some(question.clone());
                    state.error = Some(e.to_string());
                    return Err(QaError::Generation { question: question.clone(), source: e });
                }
            }
        }

        self.slot.state.lock().await.status = QaStatus::Complete;
        Ok(results)
    }
}
