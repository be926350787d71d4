// src/config.rs

use std::env;
use dotenvy::dotenv;

use crate::error::AppError;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://medquiz.db?mode=rwc";
pub const DEFAULT_CONTENT_PATH: &str = "data/medical_quizzes.json";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub content_path: String,
    pub bind_addr: String,
    /// How long a submitted session stays queryable before it is swept.
    pub session_retention_secs: u64,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| AppError::InternalServerError("JWT_SECRET must be set".to_string()))?;

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            jwt_secret,
            jwt_expiration: parse_var("JWT_EXPIRATION", 86_400)?,
            rust_log: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            content_path: env::var("CONTENT_PATH")
                .unwrap_or_else(|_| DEFAULT_CONTENT_PATH.to_string()),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            session_retention_secs: parse_var("SESSION_RETENTION_SECS", 300)?,
            admin_email: env::var("ADMIN_EMAIL").ok(),
            admin_password: env::var("ADMIN_PASSWORD").ok(),
        })
    }
}

fn parse_var(key: &str, default: u64) -> Result<u64, AppError> {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| AppError::InternalServerError(format!("{key} must be a number, got '{raw}'"))),
        Err(_) => Ok(default),
    }
}
