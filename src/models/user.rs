// src/models/user.rs

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::engine::progression::{MAX_LEVEL, MIN_LEVEL, Progression, xp_required_for_level};

use super::result::QuizResult;

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    pub name: String,

    /// Unique, stored lowercased.
    pub email: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    /// User role: 'user' or 'admin'.
    pub role: String,

    /// Cumulative experience points. Rank and level are derived from it.
    pub xp: i64,

    pub joined_at: chrono::DateTime<chrono::Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }

    pub fn progression(&self) -> Progression {
        Progression::from_xp(u32::try_from(self.xp.max(0)).unwrap_or(u32::MAX))
    }
}

/// Aggregates over a user's quiz history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub struct UserStats {
    /// Distinct quizzes attempted.
    pub total_quizzes: u32,
    pub total_attempts: u32,
    pub average_score: u32,
    pub best_score: u32,
    pub not_attempted: u32,
}

impl UserStats {
    pub fn from_history(history: &[QuizResult], available_quizzes: usize) -> Self {
        if history.is_empty() {
            return Self {
                not_attempted: available_quizzes as u32,
                ..Self::default()
            };
        }

        let distinct: HashSet<&str> = history.iter().map(|r| r.quiz_id.as_str()).collect();
        let sum: u32 = history.iter().map(|r| r.percentage).sum();
        let average = (sum as f64 / history.len() as f64).round() as u32;

        Self {
            total_quizzes: distinct.len() as u32,
            total_attempts: history.len() as u32,
            average_score: average,
            best_score: history.iter().map(|r| r.percentage).max().unwrap_or(0),
            not_attempted: available_quizzes.saturating_sub(distinct.len()) as u32,
        }
    }
}

/// Aggregated profile data for the current user.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: String,
    pub joined_at: chrono::DateTime<chrono::Utc>,
    pub progression: Progression,
    pub xp_to_next_level: Option<u32>,
    pub xp_to_next_rank: Option<u32>,
    pub stats: UserStats,
}

impl MeResponse {
    pub fn new(user: User, stats: UserStats) -> Self {
        let progression = user.progression();
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            joined_at: user.joined_at,
            progression,
            xp_to_next_level: progression.xp_to_next_level(),
            xp_to_next_rank: progression.xp_to_next_rank(),
            stats,
        }
    }
}

/// One entry of the level picker.
#[derive(Debug, Clone, Serialize)]
pub struct LevelInfo {
    pub level: u8,
    pub name: &'static str,
    pub difficulty: &'static str,
    pub unlocked: bool,
    pub xp_required: u32,
}

impl LevelInfo {
    pub fn all_for(progression: &Progression) -> Vec<Self> {
        (MIN_LEVEL..=MAX_LEVEL)
            .map(|level| {
                let (name, difficulty) = match level {
                    1 => ("Beginner", "Easy"),
                    2 => ("Novice", "Easy-Medium"),
                    3 => ("Intermediate", "Medium"),
                    4 => ("Advanced", "Medium-Hard"),
                    5 => ("Expert", "Hard"),
                    _ => ("Master", "Very Hard"),
                };
                LevelInfo {
                    level,
                    name,
                    difficulty,
                    unlocked: progression.is_unlocked(level),
                    xp_required: xp_required_for_level(level),
                }
            })
            .collect()
    }
}

/// DTO for creating a new user (Registration).
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(
        min = 1,
        max = 50,
        message = "Name length must be between 1 and 50 characters."
    ))]
    pub name: String,
    #[validate(email(message = "A valid email address is required."))]
    pub email: String,
    #[validate(length(
        min = 4,
        max = 128,
        message = "Password length must be between 4 and 128 characters."
    ))]
    pub password: String,
}

/// DTO for user login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 254))]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// DTO for editing the current user's profile. Fields are optional.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 50))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn result(quiz_id: &str, percentage: u32) -> QuizResult {
        QuizResult {
            id: format!("{quiz_id}-{percentage}"),
            quiz_id: quiz_id.to_string(),
            quiz_title: "Quiz".to_string(),
            category: "Anatomy".to_string(),
            score: 0,
            total_questions: 5,
            percentage,
            completed_at: Utc::now(),
            elapsed_seconds: 0,
            time_taken: "0m 0s".to_string(),
            attempts: vec![],
            confidence_stats: None,
            suggested_focus_areas: vec![],
            xp_earned: 0,
        }
    }

    #[test]
    fn test_stats_for_empty_history() {
        let stats = UserStats::from_history(&[], 6);
        assert_eq!(stats.total_attempts, 0);
        assert_eq!(stats.average_score, 0);
        assert_eq!(stats.not_attempted, 6);
    }

    #[test]
    fn test_stats_count_distinct_quizzes() {
        let history = [result("med1", 80), result("med1", 100), result("med2", 45)];
        let stats = UserStats::from_history(&history, 6);

        assert_eq!(stats.total_quizzes, 2);
        assert_eq!(stats.total_attempts, 3);
        assert_eq!(stats.average_score, 75);
        assert_eq!(stats.best_score, 100);
        assert_eq!(stats.not_attempted, 4);
    }

    #[test]
    fn test_levels_follow_xp() {
        let levels = LevelInfo::all_for(&Progression::from_xp(450));
        let unlocked: Vec<u8> = levels.iter().filter(|l| l.unlocked).map(|l| l.level).collect();

        assert_eq!(unlocked, vec![1, 2, 3]);
        assert_eq!(levels[5].xp_required, 1000);
        assert_eq!(levels[5].name, "Master");
    }

    #[test]
    fn test_register_payload_validation() {
        let bad = CreateUserRequest {
            name: "Ada".to_string(),
            email: "not-an-email".to_string(),
            password: "password123".to_string(),
        };
        assert!(bad.validate().is_err());

        let good = CreateUserRequest {
            email: "ada@example.com".to_string(),
            ..bad
        };
        assert!(good.validate().is_ok());
    }
}
