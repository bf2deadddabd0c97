//! HTTP-level integration tests.
//!
//! Drives the full router over an in-memory database, covering custom
//! auth (bearer tokens), the application review endpoints, and role
//! enforcement.

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::Router;
use axum_test::TestServer;
use serde_json::{json, Value};

use workbridge::config::{AuthConfig, Config, DatabaseConfig, MailConfig, ServerConfig};
use workbridge::db::{self, DbPool};
use workbridge::models::UserRole;
use workbridge::services::tokens;
use workbridge::{api, AppState};

async fn test_server() -> (TestServer, DbPool) {
    let pool = db::init_memory_pool().await.unwrap();
    db::migrate(&pool).await.unwrap();

    let config = Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            public_url: "http://localhost:8080".to_string(),
        },
        database: DatabaseConfig {
            path: ":memory:".to_string(),
        },
        mail: MailConfig {
            provider_url: None,
            api_key: None,
            from_address: "noreply@test".to_string(),
            admin_address: "admin@test".to_string(),
        },
        auth: AuthConfig {
            token_ttl_days: 7,
            signup_token_ttl_days: 7,
        },
    };

    let state = AppState::from_pool(pool.clone(), &config);
    let app = Router::new()
        .merge(api::routes(state.clone()))
        .with_state(state);

    (TestServer::new(app).unwrap(), pool)
}

fn bearer(token: &str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("authorization"),
        HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    )
}

/// Create an admin account directly and log in through the API.
async fn admin_token(server: &TestServer, pool: &DbPool) -> String {
    db::create_user(
        pool,
        db::CreateUser {
            id: "admin-1".to_string(),
            email: "admin@example.com".to_string(),
            password_hash: tokens::hash_password("admin-password"),
            role: UserRole::Admin,
            display_name: None,
        },
    )
    .await
    .unwrap();

    let response = server
        .post("/login/custom")
        .json(&json!({"email": "admin@example.com", "password": "admin-password"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    response.json::<Value>()["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health() {
    let (server, _pool) = test_server().await;

    let response = server.get("/health").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["status"], "healthy");
}

#[tokio::test]
async fn test_register_login_and_bearer_auth() {
    let (server, _pool) = test_server().await;

    let response = server
        .post("/register/custom")
        .json(&json!({
            "email": "cust@example.com",
            "password": "customer-password",
            "display_name": "Customer One"
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body = response.json::<Value>();
    let token = body["token"].as_str().unwrap();
    assert!(token.starts_with("wb_"));
    assert_eq!(body["user"]["role"], "customer");
    // The password hash never leaves the server.
    assert!(body["user"].get("password_hash").is_none());

    // The token authenticates a protected call.
    let (name, value) = bearer(token);
    let response = server
        .post("/api/jobs")
        .add_header(name, value)
        .json(&json!({
            "title": "Fix kitchen sink",
            "description": "Leaking under the basin",
            "category": "plumbing",
            "location": "Springfield",
            "timeframe": "this week",
            "budget_min": 50,
            "budget_max": 200
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["status"], "open");
}

#[tokio::test]
async fn test_tampered_and_missing_tokens_rejected() {
    let (server, _pool) = test_server().await;

    // No token
    let response = server
        .post("/api/jobs")
        .json(&json!({"title": "x"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    // Tampered token
    let (name, value) = bearer("wb_deadbeef_0000000000000000000000000000000000000000");
    let response = server
        .post("/api/jobs")
        .add_header(name, value)
        .json(&json!({"title": "x"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_application_review_requires_admin() {
    let (server, _pool) = test_server().await;

    let response = server
        .post("/register/custom")
        .json(&json!({"email": "cust@example.com", "password": "customer-password"}))
        .await;
    let token = response.json::<Value>()["token"].as_str().unwrap().to_string();

    let (name, value) = bearer(&token);
    let response = server
        .get("/api/professional/applications")
        .add_header(name, value)
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_submit_approve_signup_over_http() {
    let (server, pool) = test_server().await;
    let admin = admin_token(&server, &pool).await;

    // Public submission
    let response = server
        .post("/api/professional/submit-application")
        .json(&json!({
            "full_name": "Jane Doe",
            "email": "jane@example.com",
            "category": "plumbing",
            "years_experience": 8
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let application_id = response.json::<Value>()["id"].as_str().unwrap().to_string();

    // Admin approves; the token lands on the application
    let (name, value) = bearer(&admin);
    let response = server
        .post(&format!(
            "/api/professional/applications/{}/approve",
            application_id
        ))
        .add_header(name, value)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let token = response.json::<Value>()["signup_token"]
        .as_str()
        .unwrap()
        .to_string();

    // The signup page resolves the applicant name from the token
    let response = server
        .get(&format!("/api/professional/signup?token={}", token))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["full_name"], "Jane Doe");

    // Completing signup creates a ready-to-go professional account
    let response = server
        .post("/api/professional/complete-signup")
        .json(&json!({"token": token, "password": "janes-password"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.json::<Value>();
    assert_eq!(body["status"], "approved");
    assert_eq!(body["needs_onboarding"], false);

    // The token is spent
    let response = server
        .post("/api/professional/complete-signup")
        .json(&json!({"token": token, "password": "janes-password"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    // The new professional can log in and bid
    let response = server
        .post("/login/custom")
        .json(&json!({"email": "jane@example.com", "password": "janes-password"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["user"]["role"], "professional");
}

#[tokio::test]
async fn test_invalid_budget_rejected_with_400() {
    let (server, _pool) = test_server().await;

    let response = server
        .post("/register/custom")
        .json(&json!({"email": "cust@example.com", "password": "customer-password"}))
        .await;
    let token = response.json::<Value>()["token"].as_str().unwrap().to_string();

    let (name, value) = bearer(&token);
    let response = server
        .post("/api/jobs")
        .add_header(name, value)
        .json(&json!({
            "title": "Fix kitchen sink",
            "description": "Leaking under the basin",
            "category": "plumbing",
            "location": "Springfield",
            "timeframe": "this week",
            "budget_min": 200,
            "budget_max": 50
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["error"]["code"],
        "VALIDATION_ERROR"
    );
}

#[tokio::test]
async fn test_open_jobs_listing_is_public() {
    let (server, _pool) = test_server().await;

    let response = server.get("/api/jobs").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>().as_array().unwrap().len(), 0);
}
