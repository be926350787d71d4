// src/state.rs

use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    config::Config,
    services::{catalog::QuizCatalog, sessions::SessionManager},
    store::UserStore,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub catalog: Arc<QuizCatalog>,
    pub store: Arc<dyn UserStore>,
    pub sessions: SessionManager,
}

impl AppState {
    /// Wires a session manager to `store` using the configured retention.
    pub fn new(config: Config, catalog: QuizCatalog, store: Arc<dyn UserStore>) -> Self {
        let sessions = SessionManager::new(
            store.clone(),
            std::time::Duration::from_secs(config.session_retention_secs),
        );
        Self {
            config,
            catalog: Arc::new(catalog),
            store,
            sessions,
        }
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for Arc<QuizCatalog> {
    fn from_ref(state: &AppState) -> Self {
        state.catalog.clone()
    }
}

impl FromRef<AppState> for Arc<dyn UserStore> {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

impl FromRef<AppState> for SessionManager {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}
