// src/services/catalog.rs

use std::{collections::HashSet, path::Path, sync::Arc};

use chrono::{DateTime, Utc};
use rand::{Rng, seq::SliceRandom};

use crate::{
    engine::{
        EngineError,
        progression::{MAX_LEVEL, MIN_LEVEL},
    },
    models::quiz::{Difficulty, Quiz, QuizSummary},
};

pub const LEVEL_QUIZ_CATEGORY: &str = "Mixed Medical";

/// Minutes granted per question in generated level quizzes.
const MINUTES_PER_QUESTION: u32 = 2;

#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    #[error("failed to read quiz content: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse quiz content: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] EngineError),
    #[error("duplicate quiz id '{0}'")]
    DuplicateId(String),
}

/// Static, validated quiz bank.
#[derive(Debug, Clone, Default)]
pub struct QuizCatalog {
    quizzes: Vec<Arc<Quiz>>,
}

impl QuizCatalog {
    pub fn new(quizzes: Vec<Quiz>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for quiz in &quizzes {
            quiz.check()?;
            if !seen.insert(quiz.id.as_str()) {
                return Err(CatalogError::DuplicateId(quiz.id.clone()));
            }
        }
        Ok(Self {
            quizzes: quizzes.into_iter().map(Arc::new).collect(),
        })
    }

    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        Self::new(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let catalog = Self::from_json_str(&std::fs::read_to_string(path)?)?;
        tracing::info!(
            path = %path.display(),
            quizzes = catalog.len(),
            "Loaded quiz content"
        );
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.quizzes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quizzes.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<Arc<Quiz>> {
        self.quizzes.iter().find(|q| q.id == id).cloned()
    }

    pub fn list(&self) -> Vec<QuizSummary> {
        self.quizzes.iter().map(|q| QuizSummary::from(q.as_ref())).collect()
    }

    /// Builds a quiz from `question_count` random questions of difficulty
    /// `level`, drawn across the whole bank.
    ///
    /// Returns `Ok(None)` when the bank holds fewer matching questions than
    /// requested.
    pub fn generate_level_quiz<R: Rng + ?Sized>(
        &self,
        level: u8,
        question_count: usize,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Result<Option<Quiz>, EngineError> {
        if !(MIN_LEVEL..=MAX_LEVEL).contains(&level) {
            return Err(EngineError::InvalidLevel(level));
        }
        if question_count == 0 {
            return Err(EngineError::InvalidQuestionCount);
        }

        let mut pool: Vec<_> = self
            .quizzes
            .iter()
            .flat_map(|q| q.questions.iter())
            .filter(|q| q.difficulty == Some(level))
            .cloned()
            .collect();

        if pool.len() < question_count {
            tracing::debug!(
                level,
                requested = question_count,
                available = pool.len(),
                "Not enough questions for level quiz"
            );
            return Ok(None);
        }

        pool.shuffle(rng);
        pool.truncate(question_count);

        Ok(Some(Quiz {
            id: format!("custom-level-{}-{}", level, now.timestamp_millis()),
            title: format!("Level {} Challenge - {} Questions", level, question_count),
            category: LEVEL_QUIZ_CATEGORY.to_string(),
            difficulty: Difficulty::for_level(level),
            level: Some(level),
            questions: pool,
            time_limit: Some(question_count as u32 * MINUTES_PER_QUESTION),
        }))
    }
}
