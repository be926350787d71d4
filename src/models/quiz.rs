// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::engine::error::EngineError;

use super::question::Question;

/// Default countdown when a quiz carries no time limit.
pub const DEFAULT_TIME_LIMIT_MINUTES: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Coarse tier for a numeric level: 1-2 easy, 3-4 medium, 5-6 hard.
    pub fn for_level(level: u8) -> Self {
        match level {
            0..=2 => Difficulty::Easy,
            3..=4 => Difficulty::Medium,
            _ => Difficulty::Hard,
        }
    }
}

/// Immutable quiz definition loaded from the static content bank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Quiz {
    #[validate(length(min = 1, max = 100))]
    pub id: String,

    #[validate(length(min = 1, max = 200))]
    pub title: String,

    pub category: String,

    pub difficulty: Difficulty,

    /// Numeric level 1-6, used as the XP multiplier.
    #[validate(range(min = 1, max = 6))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,

    #[validate(length(min = 1), nested)]
    pub questions: Vec<Question>,

    /// Time limit in minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit: Option<u32>,
}

impl Quiz {
    /// Checks the definition, mapping validation failures to an engine error.
    pub fn check(&self) -> Result<(), EngineError> {
        if self.questions.is_empty() {
            return Err(EngineError::NoQuestions);
        }
        self.validate().map_err(|e| EngineError::InvalidQuiz {
            id: self.id.clone(),
            reason: e.to_string(),
        })
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// Level used for XP; quizzes without one count as level 1.
    pub fn xp_level(&self) -> u8 {
        self.level.unwrap_or(1)
    }

    pub fn time_limit_seconds(&self) -> u32 {
        self.time_limit.unwrap_or(DEFAULT_TIME_LIMIT_MINUTES) * 60
    }
}

/// Catalog listing entry.
#[derive(Debug, Clone, Serialize)]
pub struct QuizSummary {
    pub id: String,
    pub title: String,
    pub category: String,
    pub difficulty: Difficulty,
    pub level: Option<u8>,
    pub time_limit: u32,
    pub question_count: usize,
}

impl From<&Quiz> for QuizSummary {
    fn from(quiz: &Quiz) -> Self {
        Self {
            id: quiz.id.clone(),
            title: quiz.title.clone(),
            category: quiz.category.clone(),
            difficulty: quiz.difficulty,
            level: quiz.level,
            time_limit: quiz.time_limit.unwrap_or(DEFAULT_TIME_LIMIT_MINUTES),
            question_count: quiz.questions.len(),
        }
    }
}
