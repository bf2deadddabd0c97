//! Custom Auth Routes
//!
//! Routes:
//! - POST /register/custom - Create a customer account, returns a bearer token
//! - POST /login/custom - Verify credentials, returns a bearer token
//!
//! Tokens are opaque `wb_`-prefixed strings valid for 7 days, consumed via
//! an `Authorization: Bearer <token>` header on subsequent calls.

use axum::{extract::State, routing::post, Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::services::AuthOutcome;
use crate::{AppState, Result};

/// Build auth routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register/custom", post(register))
        .route("/login/custom", post(login))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Registration request.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub display_name: Option<String>,
}

/// Login request.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Auth response carrying the bearer token.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserInfo,
}

/// Public view of an account.
#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: String,
    pub email: String,
    pub role: String,
    pub display_name: Option<String>,
}

impl From<AuthOutcome> for AuthResponse {
    fn from(outcome: AuthOutcome) -> Self {
        Self {
            token: outcome.token,
            expires_at: outcome.expires_at,
            user: UserInfo {
                id: outcome.user.id,
                email: outcome.user.email,
                role: outcome.user.role,
                display_name: outcome.user.display_name,
            },
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Register a new customer account.
///
/// POST /register/custom
#[axum::debug_handler]
async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>> {
    let outcome = state
        .auth
        .register(&request.email, &request.password, request.display_name)
        .await?;

    Ok(Json(outcome.into()))
}

/// Log in with email and password.
///
/// POST /login/custom
#[axum::debug_handler]
async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let outcome = state.auth.login(&request.email, &request.password).await?;

    Ok(Json(outcome.into()))
}
