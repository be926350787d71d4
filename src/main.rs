// src/main.rs

use std::sync::Arc;
use std::time::Duration;

use medquiz::config::Config;
use medquiz::routes;
use medquiz::services::catalog::QuizCatalog;
use medquiz::state::AppState;
use medquiz::store::{SqliteUserStore, UserStore, sqlite};
use medquiz::utils::hash::hash_password;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration from environment (.env included)
    let config = Config::from_env()?;

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    let pool = sqlite::connect(&config.database_url).await?;
    tracing::info!("Database connected...");

    let catalog = QuizCatalog::from_path(&config.content_path)?;
    let store: Arc<dyn UserStore> = Arc::new(SqliteUserStore::new(pool));

    if let Err(e) = seed_admin_user(store.as_ref(), &config).await {
        tracing::error!("Failed to seed admin user: {:?}", e);
    }

    let state = AppState::new(config.clone(), catalog, store);
    let _ticker = state.sessions.spawn_ticker(Duration::from_secs(1));

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr.as_str()).await?;
    tracing::info!("Listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

async fn seed_admin_user(
    store: &dyn UserStore,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    if let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) {
        if store.find_by_email(email).await?.is_none() {
            tracing::info!("Seeding admin user: {}", email);
            let hashed_password = hash_password(password)?;
            store.create_user("Admin", email, &hashed_password, "admin").await?;
            tracing::info!("Admin user created successfully.");
        }
    }
    Ok(())
}
