// src/models/session.rs

use serde::Deserialize;
use validator::Validate;

use super::result::Confidence;

/// DTO for starting one of the catalog quizzes.
#[derive(Debug, Deserialize)]
pub struct StartQuizRequest {
    pub quiz_id: String,
}

fn default_question_count() -> usize {
    10
}

/// DTO for starting a generated quiz at a given level.
#[derive(Debug, Deserialize, Validate)]
pub struct StartLevelQuizRequest {
    #[validate(range(min = 1, max = 6))]
    pub level: u8,
    #[validate(range(min = 1, max = 50))]
    #[serde(default = "default_question_count")]
    pub question_count: usize,
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub question_index: usize,
    pub option_index: usize,
}

#[derive(Debug, Deserialize)]
pub struct ConfidenceRequest {
    pub question_index: usize,
    pub level: Confidence,
}
