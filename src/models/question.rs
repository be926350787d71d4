// src/models/question.rs

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// One multiple-choice question from the static quiz bank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = validate_correct_answer))]
pub struct Question {
    #[validate(length(min = 1, max = 100))]
    pub id: String,

    /// The prompt shown to the user.
    #[validate(length(min = 1, max = 2000))]
    pub question: String,

    /// Answer options in display order.
    #[validate(length(min = 2, max = 6))]
    pub options: Vec<String>,

    /// Index into `options` of the correct answer.
    pub correct_answer: usize,

    /// Topic label used for focus-area suggestions (e.g. "Cardiology").
    #[validate(length(min = 1, max = 100))]
    pub category: String,

    /// Difficulty tier 1-6, matched against levels when generating quizzes.
    #[validate(range(min = 1, max = 6))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<u8>,

    /// Short explanation revealed after submission.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_point: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    /// Illustration URL shown with the prompt.
    #[validate(length(max = 500))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[validate(length(max = 200))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_title: Option<String>,
}

fn validate_correct_answer(question: &Question) -> Result<(), ValidationError> {
    if question.correct_answer >= question.options.len() {
        return Err(ValidationError::new("correct_answer_out_of_range"));
    }
    Ok(())
}

/// Question as sent to a user mid-quiz (no answer, no explanation).
#[derive(Debug, Clone, Serialize)]
pub struct PublicQuestion {
    pub id: String,
    pub question: String,
    pub options: Vec<String>,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_title: Option<String>,
}

impl From<&Question> for PublicQuestion {
    fn from(q: &Question) -> Self {
        Self {
            id: q.id.clone(),
            question: q.question.clone(),
            options: q.options.clone(),
            category: q.category.clone(),
            image: q.image.clone(),
            image_title: q.image_title.clone(),
        }
    }
}
