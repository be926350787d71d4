// src/models/result.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::result::Grade;

/// Self-reported certainty about an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Confidence {
    Know,
    NotSure,
    #[default]
    DontKnow,
}

/// Outcome of one question within a submitted quiz.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionAttempt {
    pub question_id: String,

    /// Selected option index, -1 when unanswered.
    pub selected_answer: i32,

    pub is_correct: bool,

    pub confidence: Confidence,

    /// Seconds spent on the question. Not tracked yet, always 0.
    #[serde(default)]
    pub time_taken: u32,
}

impl QuestionAttempt {
    pub fn is_answered(&self) -> bool {
        self.selected_answer >= 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ConfidenceStats {
    pub know: u32,
    pub not_sure: u32,
    pub dont_know: u32,
}

/// Immutable outcome of a completed quiz session, appended to a user's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizResult {
    pub id: String,
    pub quiz_id: String,
    pub quiz_title: String,
    pub category: String,

    /// Number of correct answers.
    pub score: u32,
    pub total_questions: u32,
    pub percentage: u32,

    pub completed_at: DateTime<Utc>,

    #[serde(default)]
    pub elapsed_seconds: u64,

    /// Human readable elapsed time, e.g. "3m 7s".
    pub time_taken: String,

    #[serde(default)]
    pub attempts: Vec<QuestionAttempt>,

    /// Absent on records written before confidence tracking existed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_stats: Option<ConfidenceStats>,

    #[serde(default)]
    pub suggested_focus_areas: Vec<String>,

    #[serde(default)]
    pub xp_earned: u32,
}

impl QuizResult {
    pub fn grade(&self) -> Grade {
        Grade::from_percentage(self.percentage)
    }
}

/// Formats elapsed seconds as "{minutes}m {seconds}s".
pub fn format_elapsed(seconds: u64) -> String {
    format!("{}m {}s", seconds / 60, seconds % 60)
}
