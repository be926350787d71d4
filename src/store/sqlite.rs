// src/store/sqlite.rs

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};

use crate::{
    engine::ProgressionChange,
    error::AppError,
    models::{result::QuizResult, user::User},
};

use super::UserStore;

const USER_COLUMNS: &str = "id, name, email, password, role, xp, joined_at";

/// Opens the pool and applies migrations.
pub async fn connect(database_url: &str) -> Result<SqlitePool, AppError> {
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;
    tracing::info!("Migrations applied successfully.");

    Ok(pool)
}

#[derive(Debug, Clone)]
pub struct SqliteUserStore {
    pool: SqlitePool,
}

impl SqliteUserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn conflict_or_internal(err: sqlx::Error, email: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict(format!("Email '{}' is already registered", email))
        }
        _ => {
            tracing::error!("User write failed: {:?}", err);
            AppError::from(err)
        }
    }
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        role: &str,
    ) -> Result<User, AppError> {
        let email = email.trim().to_lowercase();

        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (name, email, password, role, xp, joined_at)
             VALUES (?, ?, ?, ?, 0, ?)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(name)
        .bind(&email)
        .bind(password_hash)
        .bind(role)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_or_internal(e, &email))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
        ))
        .bind(email.trim().to_lowercase())
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn update_profile(
        &self,
        id: i64,
        name: Option<&str>,
        email: Option<&str>,
    ) -> Result<User, AppError> {
        let email = email.map(|e| e.trim().to_lowercase());

        sqlx::query_as::<_, User>(&format!(
            "UPDATE users
             SET name = COALESCE(?, name), email = COALESCE(?, email)
             WHERE id = ?
             RETURNING {USER_COLUMNS}"
        ))
        .bind(name)
        .bind(email.as_deref())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| conflict_or_internal(e, email.as_deref().unwrap_or_default()))?
        .ok_or(AppError::NotFound("User not found".to_string()))
    }

    async fn record_result(
        &self,
        user_id: i64,
        result: &QuizResult,
    ) -> Result<ProgressionChange, AppError> {
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

        let before = user.progression();
        if user.is_admin() {
            tracing::debug!(user_id, "Skipping result for admin user");
            return Ok(ProgressionChange::unchanged(before));
        }

        let change = before.award(result.xp_earned);
        let payload = serde_json::to_string(result)
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;

        sqlx::query(
            "INSERT INTO quiz_results
                (result_id, user_id, quiz_id, percentage, xp_earned, payload, completed_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&result.id)
        .bind(user_id)
        .bind(&result.quiz_id)
        .bind(result.percentage as i64)
        .bind(result.xp_earned as i64)
        .bind(payload)
        .bind(result.completed_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE users SET xp = ? WHERE id = ?")
            .bind(change.after.xp as i64)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            user_id,
            result_id = %result.id,
            xp_earned = result.xp_earned,
            total_xp = change.after.xp,
            "Recorded quiz result"
        );

        Ok(change)
    }

    async fn history(&self, user_id: i64) -> Result<Vec<QuizResult>, AppError> {
        let payloads: Vec<String> = sqlx::query_scalar(
            "SELECT payload FROM quiz_results WHERE user_id = ? ORDER BY id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        payloads
            .iter()
            .map(|p| {
                serde_json::from_str(p).map_err(|e| {
                    AppError::InternalServerError(format!("Corrupt result payload: {}", e))
                })
            })
            .collect()
    }
}
