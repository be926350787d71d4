// src/handlers/profile.rs

use std::sync::Arc;

use axum::{Extension, Json, extract::State, response::IntoResponse};
use validator::Validate;

use crate::{
    error::AppError,
    models::user::{LevelInfo, MeResponse, UpdateProfileRequest, User, UserStats},
    services::catalog::QuizCatalog,
    store::UserStore,
    utils::jwt::Claims,
};

async fn current_user(store: &dyn UserStore, claims: &Claims) -> Result<User, AppError> {
    store
        .get_user(claims.user_id()?)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))
}

/// Get current user's profile, progression and statistics.
pub async fn get_me(
    State(store): State<Arc<dyn UserStore>>,
    State(catalog): State<Arc<QuizCatalog>>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user = current_user(store.as_ref(), &claims).await?;
    let history = store.history(user.id).await?;
    let stats = UserStats::from_history(&history, catalog.len());

    Ok(Json(MeResponse::new(user, stats)))
}

/// Update the current user's name and/or email.
pub async fn update_me(
    State(store): State<Arc<dyn UserStore>>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let user = store
        .update_profile(claims.user_id()?, req.name.as_deref(), req.email.as_deref())
        .await?;

    Ok(Json(user))
}

/// The current user's quiz results, newest first.
pub async fn get_history(
    State(store): State<Arc<dyn UserStore>>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(store.history(claims.user_id()?).await?))
}

/// The six levels with their unlock state for the current user.
pub async fn get_levels(
    State(store): State<Arc<dyn UserStore>>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user = current_user(store.as_ref(), &claims).await?;
    Ok(Json(LevelInfo::all_for(&user.progression())))
}
