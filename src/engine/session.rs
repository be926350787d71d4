// src/engine/session.rs

use std::{collections::BTreeMap, sync::Arc};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{
    question::Question,
    quiz::Quiz,
    result::{Confidence, QuizResult},
};

use super::{error::EngineError, result::finalize_result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    InProgress,
    Submitted,
}

/// What a single timer tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Still running with this many seconds left.
    Running(u32),
    /// Time ran out on this tick and the session was submitted.
    Expired,
    /// The session was already submitted; nothing changed.
    Idle,
}

/// One in-progress attempt at a quiz.
///
/// The session never reads the clock or schedules anything. Callers pass
/// the current time into `submit`/`tick` and drive `tick` once per second.
#[derive(Debug, Clone)]
pub struct Session {
    quiz: Arc<Quiz>,
    answers: BTreeMap<usize, usize>,
    confidences: BTreeMap<usize, Confidence>,
    current: usize,
    remaining_seconds: u32,
    started_at: DateTime<Utc>,
    result: Option<QuizResult>,
}

impl Session {
    /// Starts at question 0 with the full time limit.
    pub fn new(quiz: Arc<Quiz>, started_at: DateTime<Utc>) -> Result<Self, EngineError> {
        quiz.check()?;
        let remaining_seconds = quiz.time_limit_seconds();
        Ok(Self {
            quiz,
            answers: BTreeMap::new(),
            confidences: BTreeMap::new(),
            current: 0,
            remaining_seconds,
            started_at,
            result: None,
        })
    }

    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    pub fn question_count(&self) -> usize {
        self.quiz.questions.len()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_question(&self) -> &Question {
        &self.quiz.questions[self.current]
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn status(&self) -> SessionStatus {
        if self.result.is_some() {
            SessionStatus::Submitted
        } else {
            SessionStatus::InProgress
        }
    }

    pub fn is_submitted(&self) -> bool {
        self.result.is_some()
    }

    /// The terminal result, once submitted.
    pub fn result(&self) -> Option<&QuizResult> {
        self.result.as_ref()
    }

    pub fn selected_answer(&self, question: usize) -> Option<usize> {
        self.answers.get(&question).copied()
    }

    pub fn confidence(&self, question: usize) -> Option<Confidence> {
        self.confidences.get(&question).copied()
    }

    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    /// Records or replaces the chosen option for a question.
    pub fn select_answer(&mut self, question: usize, option: usize) -> Result<(), EngineError> {
        self.ensure_in_progress()?;
        let options = self.question(question)?.options.len();
        if option >= options {
            return Err(EngineError::OptionOutOfRange {
                question,
                option,
                len: options,
            });
        }
        self.answers.insert(question, option);
        Ok(())
    }

    /// Records or replaces the confidence tag for a question, answered or not.
    pub fn set_confidence(&mut self, question: usize, level: Confidence) -> Result<(), EngineError> {
        self.ensure_in_progress()?;
        self.question(question)?;
        self.confidences.insert(question, level);
        Ok(())
    }

    /// Moves to `index`, clamped to the quiz bounds. Returns the new position.
    pub fn go_to(&mut self, index: usize) -> usize {
        if !self.is_submitted() {
            self.current = index.min(self.question_count() - 1);
        }
        self.current
    }

    pub fn next(&mut self) -> usize {
        self.go_to(self.current.saturating_add(1))
    }

    pub fn previous(&mut self) -> usize {
        self.go_to(self.current.saturating_sub(1))
    }

    /// Advances the countdown by one second, submitting when it reaches zero.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Result<Tick, EngineError> {
        if self.is_submitted() {
            return Ok(Tick::Idle);
        }

        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds > 0 {
            return Ok(Tick::Running(self.remaining_seconds));
        }

        self.submit(now)?;
        Ok(Tick::Expired)
    }

    /// Scores the session. Only the first call computes anything; later calls
    /// return the same result.
    pub fn submit(&mut self, now: DateTime<Utc>) -> Result<&QuizResult, EngineError> {
        let result = match self.result.take() {
            Some(result) => result,
            None => {
                let elapsed = (now - self.started_at).num_seconds().max(0) as u64;
                finalize_result(&self.quiz, &self.answers, &self.confidences, elapsed, now)?
            }
        };
        Ok(self.result.insert(result))
    }

    fn question(&self, index: usize) -> Result<&Question, EngineError> {
        self.quiz
            .questions
            .get(index)
            .ok_or(EngineError::QuestionOutOfRange {
                index,
                len: self.quiz.questions.len(),
            })
    }

    fn ensure_in_progress(&self) -> Result<(), EngineError> {
        if self.is_submitted() {
            return Err(EngineError::AlreadySubmitted);
        }
        Ok(())
    }
}
