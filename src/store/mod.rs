// src/store/mod.rs

//! Persistence port for users, XP and quiz history.

use async_trait::async_trait;

use crate::{
    engine::ProgressionChange,
    error::AppError,
    models::{result::QuizResult, user::User},
};

pub mod sqlite;

pub use sqlite::SqliteUserStore;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Creates a user. Fails with `Conflict` if the email is taken.
    async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        role: &str,
    ) -> Result<User, AppError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn get_user(&self, id: i64) -> Result<Option<User>, AppError>;

    async fn update_profile(
        &self,
        id: i64,
        name: Option<&str>,
        email: Option<&str>,
    ) -> Result<User, AppError>;

    /// Appends `result` to the user's history and adds its XP, atomically.
    async fn record_result(
        &self,
        user_id: i64,
        result: &QuizResult,
    ) -> Result<ProgressionChange, AppError>;

    /// The user's results, newest first.
    async fn history(&self, user_id: i64) -> Result<Vec<QuizResult>, AppError>;
}
