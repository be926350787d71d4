// tests/api_tests.rs

use std::sync::Arc;

use medquiz::{
    config::Config,
    routes,
    services::catalog::QuizCatalog,
    state::AppState,
    store::{SqliteUserStore, UserStore, sqlite},
};
use serde_json::{Value, json};
use tempfile::TempDir;

/// A running app on a random port. The temp dir holds the SQLite file and
/// must outlive the server.
struct TestApp {
    address: String,
    _db_dir: TempDir,
}

/// Helper function to spawn the app on a random port for testing.
async fn spawn_app() -> TestApp {
    // 1. Fresh SQLite database per test
    let db_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let database_url = format!(
        "sqlite://{}?mode=rwc",
        db_dir.path().join("test.db").display()
    );
    let pool = sqlite::connect(&database_url)
        .await
        .expect("Failed to open test database");

    // 2. Create test configuration and state
    let config = Config {
        database_url,
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        rust_log: "error".to_string(),
        content_path: "data/medical_quizzes.json".to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        session_retention_secs: 300,
        admin_email: None,
        admin_password: None,
    };

    let catalog = QuizCatalog::from_path(&config.content_path).expect("Failed to load catalog");
    let store: Arc<dyn UserStore> = Arc::new(SqliteUserStore::new(pool));
    let state = AppState::new(config, catalog, store);

    // 3. Create the router with the app state
    let app = routes::create_router(state);

    // 4. Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    // 5. Spawn the server in the background
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        _db_dir: db_dir,
    }
}

/// Registers a user and returns a bearer token for it.
async fn register_and_login(client: &reqwest::Client, address: &str, email: &str) -> String {
    let res = client
        .post(format!("{}/api/auth/register", address))
        .json(&json!({ "name": "Test Student", "email": email, "password": "password123" }))
        .send()
        .await
        .expect("Failed to register");
    assert_eq!(res.status().as_u16(), 201);

    let res = client
        .post(format!("{}/api/auth/login", address))
        .json(&json!({ "email": email, "password": "password123" }))
        .send()
        .await
        .expect("Failed to login");
    assert_eq!(res.status().as_u16(), 200);

    let body: Value = res.json().await.unwrap();
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_check_404() {
    // Arrange
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    // Act
    let response = client
        .get(format!("{}/random_path_that_does_not_exist", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn register_works() {
    // Arrange
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    // Act
    let response = client
        .post(format!("{}/api/auth/register", app.address))
        .json(&json!({
            "name": "Dr. House",
            "email": "house@example.com",
            "password": "password123"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["email"], "house@example.com");
    assert_eq!(body["xp"], 0);
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn register_fails_validation() {
    // Arrange
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    // Act: Send an email that is not an email
    let response = client
        .post(format!("{}/api/auth/register", app.address))
        .json(&json!({
            "name": "Someone",
            "email": "not-an-email",
            "password": "password123"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    register_and_login(&client, &app.address, "dup@example.com").await;

    let response = client
        .post(format!("{}/api/auth/register", app.address))
        .json(&json!({ "name": "Other", "email": "dup@example.com", "password": "password123" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 409);
}

#[tokio::test]
async fn login_rejects_wrong_password() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    register_and_login(&client, &app.address, "wrong@example.com").await;

    let response = client
        .post(format!("{}/api/auth/login", app.address))
        .json(&json!({ "email": "wrong@example.com", "password": "nope1234" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn sessions_require_authentication() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/sessions", app.address))
        .json(&json!({ "quiz_id": "med1" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn catalog_lists_quizzes_without_answers() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/quizzes", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let quizzes: Vec<Value> = response.json().await.unwrap();
    assert_eq!(quizzes.len(), 10);
    assert_eq!(quizzes[0]["id"], "med1");
    assert!(quizzes[0].get("questions").is_none());
}

#[tokio::test]
async fn test_full_quiz_flow() {
    // Arrange
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let token = register_and_login(&client, &app.address, "flow@example.com").await;

    // 1. Start med1
    let res = client
        .post(format!("{}/api/sessions", app.address))
        .bearer_auth(&token)
        .json(&json!({ "quiz_id": "med1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 201);
    let view: Value = res.json().await.unwrap();
    let session_id = view["id"].as_str().unwrap().to_string();
    assert_eq!(view["question_count"], 5);
    assert_eq!(view["current_index"], 0);
    assert_eq!(view["status"], "in_progress");
    assert!(view["question"].get("correct_answer").is_none());

    // 2. Answer every question correctly, marking each as known
    let correct = [2, 1, 2, 3, 1];
    for (index, option) in correct.iter().enumerate() {
        let res = client
            .put(format!("{}/api/sessions/{}/answer", app.address, session_id))
            .bearer_auth(&token)
            .json(&json!({ "question_index": index, "option_index": option }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status().as_u16(), 200);

        let res = client
            .put(format!("{}/api/sessions/{}/confidence", app.address, session_id))
            .bearer_auth(&token)
            .json(&json!({ "question_index": index, "level": "know" }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status().as_u16(), 200);
    }

    // 3. Navigation clamps at the last question
    let res = client
        .post(format!("{}/api/sessions/{}/navigate", app.address, session_id))
        .bearer_auth(&token)
        .json(&json!({ "action": "go_to", "index": 99 }))
        .send()
        .await
        .unwrap();
    let view: Value = res.json().await.unwrap();
    assert_eq!(view["current_index"], 4);
    assert_eq!(view["answered_count"], 5);

    // 4. Submit twice; the second call returns the same outcome
    let res = client
        .post(format!("{}/api/sessions/{}/submit", app.address, session_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);
    let outcome: Value = res.json().await.unwrap();
    assert_eq!(outcome["result"]["score"], 5);
    assert_eq!(outcome["result"]["percentage"], 100);
    assert_eq!(outcome["grade"], "A+");
    let xp_earned = outcome["result"]["xp_earned"].as_u64().unwrap();
    assert!(xp_earned > 0);

    let again: Value = client
        .post(format!("{}/api/sessions/{}/submit", app.address, session_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(again["result"]["id"], outcome["result"]["id"]);

    // 5. Answering after submit is rejected
    let res = client
        .put(format!("{}/api/sessions/{}/answer", app.address, session_id))
        .bearer_auth(&token)
        .json(&json!({ "question_index": 0, "option_index": 0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 400);

    // 6. XP and history were recorded exactly once
    let me: Value = client
        .get(format!("{}/api/me", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me["progression"]["xp"].as_u64().unwrap(), xp_earned);
    assert_eq!(me["stats"]["total_attempts"], 1);
    assert_eq!(me["stats"]["not_attempted"], 9);

    let history: Vec<Value> = client
        .get(format!("{}/api/me/history", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["quiz_id"], "med1");

    // 7. Leaving the session removes it
    let res = client
        .delete(format!("{}/api/sessions/{}", app.address, session_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 204);

    let res = client
        .get(format!("{}/api/sessions/{}", app.address, session_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 404);
}

#[tokio::test]
async fn sessions_are_private_to_their_owner() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let alice = register_and_login(&client, &app.address, "alice@example.com").await;
    let bob = register_and_login(&client, &app.address, "bob@example.com").await;

    let view: Value = client
        .post(format!("{}/api/sessions", app.address))
        .bearer_auth(&alice)
        .json(&json!({ "quiz_id": "med2" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let session_id = view["id"].as_str().unwrap();

    let res = client
        .post(format!("{}/api/sessions/{}/submit", app.address, session_id))
        .bearer_auth(&bob)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 404);
}

#[tokio::test]
async fn test_level_quiz_gating() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let token = register_and_login(&client, &app.address, "levels@example.com").await;

    // Levels: only the first is open for a new user
    let levels: Vec<Value> = client
        .get(format!("{}/api/me/levels", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(levels.len(), 6);
    assert_eq!(levels[0]["unlocked"], true);
    assert_eq!(levels[1]["unlocked"], false);

    // Locked level
    let res = client
        .post(format!("{}/api/sessions/level", app.address))
        .bearer_auth(&token)
        .json(&json!({ "level": 3, "question_count": 5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 403);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Level 3 is locked! Earn 400 more XP to unlock.");

    // Bank holds five level-1 questions
    let res = client
        .post(format!("{}/api/sessions/level", app.address))
        .bearer_auth(&token)
        .json(&json!({ "level": 1, "question_count": 10 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 422);

    let res = client
        .post(format!("{}/api/sessions/level", app.address))
        .bearer_auth(&token)
        .json(&json!({ "level": 1, "question_count": 5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 201);
    let view: Value = res.json().await.unwrap();
    assert_eq!(view["question_count"], 5);
    assert_eq!(view["category"], "Mixed Medical");
    assert_eq!(view["remaining_seconds"], 600);
}

#[tokio::test]
async fn profile_update_changes_name() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let token = register_and_login(&client, &app.address, "rename@example.com").await;

    let res = client
        .put(format!("{}/api/me", app.address))
        .bearer_auth(&token)
        .json(&json!({ "name": "Renamed" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["name"], "Renamed");
    assert_eq!(body["email"], "rename@example.com");
}

#[tokio::test]
async fn illustrated_quiz_exposes_question_image() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let token = register_and_login(&client, &app.address, "images@example.com").await;

    let res = client
        .post(format!("{}/api/sessions", app.address))
        .bearer_auth(&token)
        .json(&json!({ "quiz_id": "m1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 201);

    let view: Value = res.json().await.unwrap();
    assert_eq!(view["quiz_title"], "Human Anatomy");
    assert_eq!(view["remaining_seconds"], 720);
    assert_eq!(view["question"]["image_title"], "Human Heart");
    assert!(view["question"]["image"].as_str().unwrap().starts_with("https://"));
    assert!(view["question"].get("correct_answer").is_none());
}
