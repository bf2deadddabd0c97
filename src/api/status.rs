//! Status Routes
//!
//! Routes:
//! - GET /health - Basic health check

use axum::{extract::State, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{AppState, Result};

/// Build status routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}

/// Basic health check.
///
/// GET /health
#[axum::debug_handler]
async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>> {
    // A failing pool turns the health check red.
    sqlx::query("SELECT 1").execute(&state.db).await?;

    Ok(Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
    }))
}
