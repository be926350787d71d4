// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{auth, profile, quiz},
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Assembles the main application router.
///
/// * Public: registration, login and the quiz catalog.
/// * Protected: profile and everything under `/api/sessions`.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin([
            HeaderValue::from_static("http://localhost:3000"),
            HeaderValue::from_static("http://127.0.0.1:3000"),
        ])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let quiz_routes = Router::new().route("/", get(quiz::list_quizzes));

    let me_routes = Router::new()
        .route("/", get(profile::get_me).put(profile::update_me))
        .route("/history", get(profile::get_history))
        .route("/levels", get(profile::get_levels))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let session_routes = Router::new()
        .route("/", post(quiz::start_quiz))
        .route("/level", post(quiz::start_level_quiz))
        .route("/{id}", get(quiz::get_session).delete(quiz::exit))
        .route("/{id}/answer", put(quiz::select_answer))
        .route("/{id}/confidence", put(quiz::set_confidence))
        .route("/{id}/navigate", post(quiz::navigate))
        .route("/{id}/submit", post(quiz::submit))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/quizzes", quiz_routes)
        .nest("/api/me", me_routes)
        .nest("/api/sessions", session_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
