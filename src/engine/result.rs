// src/engine/result.rs

use std::{collections::BTreeMap, fmt};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{
    quiz::Quiz,
    result::{Confidence, ConfidenceStats, QuestionAttempt, QuizResult, format_elapsed},
};

use super::{error::EngineError, progression::compute_xp};

/// Accuracy assumed for results that carry no confidence statistics.
///
/// Legacy value kept for compatibility; there is no known derivation for 70.
pub const DEFAULT_CONFIDENCE_ACCURACY: f64 = 70.0;

const MAX_FOCUS_AREAS: usize = 3;

/// Letter grade shown on the result page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Grade {
    #[serde(rename = "D")]
    D,
    #[serde(rename = "C")]
    C,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "A")]
    A,
    #[serde(rename = "A+")]
    APlus,
}

impl Grade {
    pub fn from_percentage(percentage: u32) -> Self {
        match percentage {
            90.. => Grade::APlus,
            80..=89 => Grade::A,
            70..=79 => Grade::B,
            60..=69 => Grade::C,
            _ => Grade::D,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Grade::APlus => "Outstanding!",
            Grade::A => "Excellent!",
            Grade::B => "Great job!",
            Grade::C => "Good effort!",
            Grade::D => "Keep practicing!",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
        };
        f.write_str(label)
    }
}

/// Builds one attempt per question, in quiz order.
///
/// Unanswered questions get `selected_answer = -1` and count as incorrect;
/// unrated questions default to `DontKnow`.
pub fn build_attempts(
    quiz: &Quiz,
    answers: &BTreeMap<usize, usize>,
    confidences: &BTreeMap<usize, Confidence>,
) -> Vec<QuestionAttempt> {
    quiz.questions
        .iter()
        .enumerate()
        .map(|(index, question)| {
            let selected = answers.get(&index).copied();
            QuestionAttempt {
                question_id: question.id.clone(),
                selected_answer: selected.map_or(-1, |option| option as i32),
                is_correct: selected == Some(question.correct_answer),
                confidence: confidences.get(&index).copied().unwrap_or_default(),
                time_taken: 0,
            }
        })
        .collect()
}

/// Know / not-sure counts, with everything else folded into dont-know.
pub fn confidence_stats(attempts: &[QuestionAttempt]) -> ConfidenceStats {
    let count = |level: Confidence| attempts.iter().filter(|a| a.confidence == level).count() as u32;
    let know = count(Confidence::Know);
    let not_sure = count(Confidence::NotSure);
    ConfidenceStats {
        know,
        not_sure,
        dont_know: attempts.len() as u32 - (know + not_sure),
    }
}

/// Percentage of "know" answers that were correct.
///
/// Falls back to [`DEFAULT_CONFIDENCE_ACCURACY`] when `stats` is absent.
pub fn confidence_accuracy(stats: Option<&ConfidenceStats>, attempts: &[QuestionAttempt]) -> f64 {
    let Some(stats) = stats else {
        return DEFAULT_CONFIDENCE_ACCURACY;
    };
    let known_correct = attempts
        .iter()
        .filter(|a| a.confidence == Confidence::Know && a.is_correct)
        .count();
    known_correct as f64 / stats.know.max(1) as f64 * 100.0
}

/// Up to three categories of incorrectly answered questions, most frequent
/// first. Ties keep the order in which categories were first missed.
pub fn suggested_focus_areas(quiz: &Quiz, attempts: &[QuestionAttempt]) -> Vec<String> {
    let mut tally: Vec<(&str, u32)> = Vec::new();
    for (question, attempt) in quiz.questions.iter().zip(attempts) {
        if attempt.is_correct {
            continue;
        }
        match tally.iter_mut().find(|(category, _)| *category == question.category) {
            Some((_, count)) => *count += 1,
            None => tally.push((question.category.as_str(), 1)),
        }
    }

    tally.sort_by(|a, b| b.1.cmp(&a.1));
    tally
        .into_iter()
        .take(MAX_FOCUS_AREAS)
        .map(|(category, _)| category.to_string())
        .collect()
}

pub fn percentage(score: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    (score as f64 / total as f64 * 100.0).round() as u32
}

/// Turns the raw answer and confidence maps of a finished session into a
/// scored, immutable [`QuizResult`].
pub fn finalize_result(
    quiz: &Quiz,
    answers: &BTreeMap<usize, usize>,
    confidences: &BTreeMap<usize, Confidence>,
    elapsed_seconds: u64,
    completed_at: DateTime<Utc>,
) -> Result<QuizResult, EngineError> {
    if quiz.questions.is_empty() {
        return Err(EngineError::NoQuestions);
    }

    let attempts = build_attempts(quiz, answers, confidences);
    let total = attempts.len() as u32;
    let score = attempts.iter().filter(|a| a.is_correct).count() as u32;

    let stats = confidence_stats(&attempts);
    let accuracy = confidence_accuracy(Some(&stats), &attempts);
    let suggested_focus_areas = suggested_focus_areas(quiz, &attempts);
    let xp_earned = compute_xp(score, total, quiz.xp_level(), accuracy)?;

    Ok(QuizResult {
        id: uuid::Uuid::new_v4().to_string(),
        quiz_id: quiz.id.clone(),
        quiz_title: quiz.title.clone(),
        category: quiz.category.clone(),
        score,
        total_questions: total,
        percentage: percentage(score, total),
        completed_at,
        elapsed_seconds,
        time_taken: format_elapsed(elapsed_seconds),
        attempts,
        confidence_stats: Some(stats),
        suggested_focus_areas,
        xp_earned,
    })
}
