// src/engine/error.rs

/// Contract violations raised by the quiz engine.
///
/// These point at a caller or content bug. Content shortages are not errors;
/// see `QuizCatalog::generate_level_quiz`.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("a quiz must contain at least one question")]
    NoQuestions,

    #[error("question index {index} is out of range for a quiz of {len} questions")]
    QuestionOutOfRange { index: usize, len: usize },

    #[error("option index {option} is out of range for question {question} ({len} options)")]
    OptionOutOfRange {
        question: usize,
        option: usize,
        len: usize,
    },

    #[error("level {0} is outside 1..=6")]
    InvalidLevel(u8),

    #[error("score {score} exceeds total questions {total}")]
    ScoreOutOfRange { score: u32, total: u32 },

    #[error("question count must be at least 1")]
    InvalidQuestionCount,

    #[error("invalid quiz '{id}': {reason}")]
    InvalidQuiz { id: String, reason: String },

    #[error("session has already been submitted")]
    AlreadySubmitted,
}
