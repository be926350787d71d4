// src/handlers/quiz.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    engine::progression::xp_required_for_level,
    error::AppError,
    models::session::{AnswerRequest, ConfidenceRequest, StartLevelQuizRequest, StartQuizRequest},
    services::{
        catalog::QuizCatalog,
        sessions::{Navigation, SessionManager},
    },
    store::UserStore,
    utils::jwt::Claims,
};

/// Lists the catalog quizzes (no questions).
pub async fn list_quizzes(State(catalog): State<Arc<QuizCatalog>>) -> impl IntoResponse {
    Json(catalog.list())
}

/// Starts a session for one of the catalog quizzes.
pub async fn start_quiz(
    State(catalog): State<Arc<QuizCatalog>>,
    State(sessions): State<SessionManager>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<StartQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = catalog
        .get(&req.quiz_id)
        .ok_or_else(|| AppError::NotFound(format!("Quiz '{}' not found", req.quiz_id)))?;

    let view = sessions.start(claims.user_id()?, quiz).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// Starts a session on a freshly generated quiz for an unlocked level.
///
/// * 403 if the user's XP has not unlocked the level yet.
/// * 422 if the bank holds too few questions at that level.
pub async fn start_level_quiz(
    State(catalog): State<Arc<QuizCatalog>>,
    State(sessions): State<SessionManager>,
    State(store): State<Arc<dyn UserStore>>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<StartLevelQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let user_id = claims.user_id()?;
    let user = store
        .get_user(user_id)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    let progression = user.progression();
    if !progression.is_unlocked(req.level) {
        let missing = xp_required_for_level(req.level) - progression.xp;
        return Err(AppError::Forbidden(format!(
            "Level {} is locked! Earn {} more XP to unlock.",
            req.level, missing
        )));
    }

    let generated = {
        let mut rng = rand::thread_rng();
        catalog.generate_level_quiz(req.level, req.question_count, &mut rng, Utc::now())?
    };
    let quiz = generated.ok_or(AppError::Unprocessable(
        "Not enough questions available for this level".to_string(),
    ))?;

    let view = sessions.start(user_id, Arc::new(quiz)).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn get_session(
    State(sessions): State<SessionManager>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(sessions.view(claims.user_id()?, id).await?))
}

pub async fn select_answer(
    State(sessions): State<SessionManager>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(req): Json<AnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let view = sessions
        .select_answer(claims.user_id()?, id, req.question_index, req.option_index)
        .await?;
    Ok(Json(view))
}

pub async fn set_confidence(
    State(sessions): State<SessionManager>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(req): Json<ConfidenceRequest>,
) -> Result<impl IntoResponse, AppError> {
    let view = sessions
        .set_confidence(claims.user_id()?, id, req.question_index, req.level)
        .await?;
    Ok(Json(view))
}

/// Moves the question pointer: `{"action": "next" | "previous"}` or
/// `{"action": "go_to", "index": n}`.
pub async fn navigate(
    State(sessions): State<SessionManager>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(navigation): Json<Navigation>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(sessions.navigate(claims.user_id()?, id, navigation).await?))
}

/// Submits the session, recording the result and awarding XP once.
pub async fn submit(
    State(sessions): State<SessionManager>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(sessions.submit(claims.user_id()?, id).await?))
}

/// Leaves a session without recording anything.
pub async fn exit(
    State(sessions): State<SessionManager>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    sessions.exit(claims.user_id()?, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
