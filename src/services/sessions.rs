// src/services/sessions.rs

use std::{collections::HashMap, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::{sync::Mutex, task::JoinHandle, time};
use uuid::Uuid;

use crate::{
    engine::{Grade, ProgressionChange, Session, SessionStatus, Tick},
    error::AppError,
    models::{
        question::PublicQuestion,
        quiz::Quiz,
        result::{Confidence, QuizResult},
    },
    store::UserStore,
};

/// What the user gets back once a session is scored and recorded.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionOutcome {
    pub result: QuizResult,
    pub grade: Grade,
    pub message: &'static str,
    pub progression: ProgressionChange,
}

impl SubmissionOutcome {
    fn new(result: QuizResult, progression: ProgressionChange) -> Self {
        let grade = result.grade();
        Self {
            result,
            grade,
            message: grade.message(),
            progression,
        }
    }
}

/// Snapshot of a session as shown to its owner.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub quiz_id: String,
    pub quiz_title: String,
    pub category: String,
    pub status: SessionStatus,
    pub current_index: usize,
    pub question_count: usize,
    pub question: PublicQuestion,
    pub selected_answer: Option<usize>,
    pub confidence: Option<Confidence>,
    /// Per question, whether an answer has been picked.
    pub answered: Vec<bool>,
    pub answered_count: usize,
    pub remaining_seconds: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<SubmissionOutcome>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Navigation {
    Next,
    Previous,
    GoTo { index: usize },
}

/// Ticker attempts to record an expired session before it is given up.
const MAX_RECORD_ATTEMPTS: u32 = 5;

struct LiveSession {
    owner: i64,
    session: Session,
    outcome: Option<SubmissionOutcome>,
    /// Set once the outcome is recorded, or once the ticker gives up on it.
    finished_at: Option<DateTime<Utc>>,
    failed_writes: u32,
}

impl LiveSession {
    fn view(&self, id: Uuid) -> SessionView {
        let session = &self.session;
        let current = session.current_index();
        SessionView {
            id,
            quiz_id: session.quiz().id.clone(),
            quiz_title: session.quiz().title.clone(),
            category: session.quiz().category.clone(),
            status: session.status(),
            current_index: current,
            question_count: session.question_count(),
            question: PublicQuestion::from(session.current_question()),
            selected_answer: session.selected_answer(current),
            confidence: session.confidence(current),
            answered: (0..session.question_count())
                .map(|i| session.selected_answer(i).is_some())
                .collect(),
            answered_count: session.answered_count(),
            remaining_seconds: session.remaining_seconds(),
            outcome: self.outcome.clone(),
        }
    }

    /// Submits if needed and records the result once. A failed write leaves
    /// the outcome empty so the next call retries it.
    async fn finish(
        &mut self,
        store: &dyn UserStore,
        now: DateTime<Utc>,
    ) -> Result<SubmissionOutcome, AppError> {
        if let Some(outcome) = &self.outcome {
            return Ok(outcome.clone());
        }

        let result = self.session.submit(now)?.clone();
        let progression = store.record_result(self.owner, &result).await?;
        let outcome = SubmissionOutcome::new(result, progression);

        self.outcome = Some(outcome.clone());
        self.finished_at = Some(now);
        Ok(outcome)
    }
}

/// Owns every live quiz session and the one-second timer that drives them.
///
/// All commands go through one async mutex, so a session only ever sees one
/// command at a time.
#[derive(Clone)]
pub struct SessionManager {
    sessions: Arc<Mutex<HashMap<Uuid, LiveSession>>>,
    store: Arc<dyn UserStore>,
    retention: chrono::Duration,
}

impl SessionManager {
    pub fn new(store: Arc<dyn UserStore>, retention: Duration) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            store,
            retention: chrono::Duration::from_std(retention).unwrap_or(chrono::Duration::MAX),
        }
    }

    /// Starts a session for `owner`. Any of the owner's sessions still in
    /// progress are discarded without recording, so a user runs one quiz at a
    /// time.
    pub async fn start(&self, owner: i64, quiz: Arc<Quiz>) -> Result<SessionView, AppError> {
        let quiz_id = quiz.id.clone();
        let session = Session::new(quiz, Utc::now())?;
        let id = Uuid::new_v4();
        let live = LiveSession {
            owner,
            session,
            outcome: None,
            finished_at: None,
            failed_writes: 0,
        };
        let view = live.view(id);

        let mut sessions = self.sessions.lock().await;
        sessions.retain(|previous, other| {
            let replaced = other.owner == owner && !other.session.is_submitted();
            if replaced {
                tracing::info!(session_id = %previous, user_id = owner, "Replacing unfinished quiz session");
            }
            !replaced
        });
        sessions.insert(id, live);
        drop(sessions);
        tracing::info!(session_id = %id, user_id = owner, quiz_id = %quiz_id, "Quiz session started");

        Ok(view)
    }

    pub async fn view(&self, owner: i64, id: Uuid) -> Result<SessionView, AppError> {
        let mut sessions = self.sessions.lock().await;
        Ok(owned(&mut sessions, owner, id)?.view(id))
    }

    pub async fn select_answer(
        &self,
        owner: i64,
        id: Uuid,
        question: usize,
        option: usize,
    ) -> Result<SessionView, AppError> {
        let mut sessions = self.sessions.lock().await;
        let live = owned(&mut sessions, owner, id)?;
        live.session.select_answer(question, option)?;
        Ok(live.view(id))
    }

    pub async fn set_confidence(
        &self,
        owner: i64,
        id: Uuid,
        question: usize,
        level: Confidence,
    ) -> Result<SessionView, AppError> {
        let mut sessions = self.sessions.lock().await;
        let live = owned(&mut sessions, owner, id)?;
        live.session.set_confidence(question, level)?;
        Ok(live.view(id))
    }

    pub async fn navigate(
        &self,
        owner: i64,
        id: Uuid,
        navigation: Navigation,
    ) -> Result<SessionView, AppError> {
        let mut sessions = self.sessions.lock().await;
        let live = owned(&mut sessions, owner, id)?;
        match navigation {
            Navigation::Next => live.session.next(),
            Navigation::Previous => live.session.previous(),
            Navigation::GoTo { index } => live.session.go_to(index),
        };
        Ok(live.view(id))
    }

    /// Scores the session and records it. Repeated calls return the first
    /// outcome.
    pub async fn submit(&self, owner: i64, id: Uuid) -> Result<SubmissionOutcome, AppError> {
        let mut sessions = self.sessions.lock().await;
        let live = owned(&mut sessions, owner, id)?;
        let already_recorded = live.outcome.is_some();
        let outcome = live.finish(self.store.as_ref(), Utc::now()).await?;

        if !already_recorded {
            tracing::info!(
                session_id = %id,
                user_id = owner,
                score = outcome.result.score,
                total = outcome.result.total_questions,
                xp_earned = outcome.result.xp_earned,
                "Quiz session submitted"
            );
        }
        Ok(outcome)
    }

    /// Discards a session. Nothing is recorded for unsubmitted sessions.
    pub async fn exit(&self, owner: i64, id: Uuid) -> Result<(), AppError> {
        let mut sessions = self.sessions.lock().await;
        owned(&mut sessions, owner, id)?;
        if let Some(live) = sessions.remove(&id) {
            tracing::info!(
                session_id = %id,
                user_id = owner,
                submitted = live.session.is_submitted(),
                "Quiz session closed"
            );
        }
        Ok(())
    }

    /// Advances every running session by one second, records sessions whose
    /// time ran out, and drops submitted sessions past their retention.
    ///
    /// The session map stays locked across each store write. A result that
    /// fails to record is retried on later passes, up to
    /// `MAX_RECORD_ATTEMPTS`, then left to the retention sweep.
    ///
    /// Returns how many results were recorded on this pass.
    pub async fn tick_all(&self) -> usize {
        let now = Utc::now();
        let mut recorded = 0;
        let mut sessions = self.sessions.lock().await;

        for (id, live) in sessions.iter_mut() {
            match live.session.tick(now) {
                Ok(Tick::Expired) => {
                    tracing::info!(session_id = %id, user_id = live.owner, "Quiz time expired, auto-submitting");
                }
                Ok(Tick::Running(_) | Tick::Idle) => {}
                Err(e) => {
                    tracing::error!(session_id = %id, "Failed to tick session: {}", e);
                    continue;
                }
            }

            if live.session.is_submitted() && live.outcome.is_none() && live.finished_at.is_none() {
                match live.finish(self.store.as_ref(), now).await {
                    Ok(_) => recorded += 1,
                    Err(e) => {
                        live.failed_writes += 1;
                        if live.failed_writes >= MAX_RECORD_ATTEMPTS {
                            tracing::error!(
                                session_id = %id,
                                user_id = live.owner,
                                attempts = live.failed_writes,
                                "Giving up on recording result: {}",
                                e
                            );
                            live.finished_at = Some(now);
                        } else {
                            tracing::warn!(session_id = %id, "Failed to record result, will retry: {}", e);
                        }
                    }
                }
            }
        }

        let retention = self.retention;
        sessions.retain(|id, live| match live.finished_at {
            Some(finished) if now - finished >= retention => {
                tracing::debug!(session_id = %id, "Dropping finished session");
                false
            }
            _ => true,
        });

        recorded
    }

    /// Runs [`Self::tick_all`] every `period` on the tokio runtime.
    pub fn spawn_ticker(&self, period: Duration) -> JoinHandle<()> {
        let manager = self.clone();
        tokio::spawn(async move {
            let mut interval = time::interval(period);
            loop {
                interval.tick().await;
                manager.tick_all().await;
            }
        })
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

/// Looks up a session owned by `owner`. Sessions of other users are
/// reported as missing.
fn owned(
    sessions: &mut HashMap<Uuid, LiveSession>,
    owner: i64,
    id: Uuid,
) -> Result<&mut LiveSession, AppError> {
    sessions
        .get_mut(&id)
        .filter(|live| live.owner == owner)
        .ok_or(AppError::NotFound("Session not found".to_string()))
}
