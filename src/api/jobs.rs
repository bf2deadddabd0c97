//! Job Routes
//!
//! Routes:
//! - GET  /api/jobs - List open jobs (public, capped at 50)
//! - GET  /api/jobs/search?q=term - Substring search over open jobs (public)
//! - GET  /api/jobs/:id - Get a job with its bids (public)
//! - POST /api/jobs - Post a job (customer)
//! - POST /api/jobs/:id/bids - Place a bid (approved professional)
//! - POST /api/jobs/:id/complete - Mark an in-progress job done (customer)
//! - POST /api/jobs/:id/cancel - Cancel an unfinished job (customer)

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;

use crate::db::{Bid, Job};
use crate::middleware::{require_token, AuthContext};
use crate::models::UserRole;
use crate::services::{JobWithBids, PlaceBid, PostJob};
use crate::{AppState, Result};

/// Build job routes.
pub fn routes(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/", get(list_jobs))
        .route("/search", get(search_jobs))
        .route("/:job_id", get(get_job));

    let protected = Router::new()
        .route("/", post(create_job))
        .route("/:job_id/bids", post(place_bid))
        .route("/:job_id/complete", post(complete_job))
        .route("/:job_id/cancel", post(cancel_job))
        .layer(axum::middleware::from_fn_with_state(state, require_token));

    public.merge(protected)
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Job posting request.
#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub title: String,
    pub description: String,
    pub category: String,
    pub location: String,
    pub timeframe: String,
    pub budget_min: i64,
    pub budget_max: i64,
}

/// Query parameters for listing open jobs.
#[derive(Debug, Deserialize, Default)]
pub struct ListJobsQuery {
    /// Filter by category
    pub category: Option<String>,
}

/// Query parameters for searching open jobs.
#[derive(Debug, Deserialize)]
pub struct SearchJobsQuery {
    pub q: String,
    pub category: Option<String>,
}

/// Bid placement request.
#[derive(Debug, Deserialize)]
pub struct PlaceBidRequest {
    pub amount: i64,
    pub message: Option<String>,
    pub estimated_duration: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// List open jobs, newest first.
///
/// GET /api/jobs
#[axum::debug_handler]
async fn list_jobs(
    State(state): State<AppState>,
    Query(query): Query<ListJobsQuery>,
) -> Result<Json<Vec<Job>>> {
    let jobs = state.ledger.list_open_jobs(query.category.as_deref()).await?;
    Ok(Json(jobs))
}

/// Case-insensitive substring search over open jobs.
///
/// GET /api/jobs/search?q=term
#[axum::debug_handler]
async fn search_jobs(
    State(state): State<AppState>,
    Query(query): Query<SearchJobsQuery>,
) -> Result<Json<Vec<Job>>> {
    let jobs = state
        .ledger
        .search_jobs(&query.q, query.category.as_deref())
        .await?;
    Ok(Json(jobs))
}

/// Get a job with its bids.
///
/// GET /api/jobs/:id
#[axum::debug_handler]
async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<JobWithBids>> {
    let job = state.ledger.get_job(&job_id).await?;
    Ok(Json(job))
}

/// Post a new job.
///
/// POST /api/jobs
#[axum::debug_handler]
async fn create_job(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<CreateJobRequest>,
) -> Result<Json<Job>> {
    auth.require_role(UserRole::Customer)?;

    let job = state
        .ledger
        .create_job(
            &auth.user_id,
            PostJob {
                title: request.title,
                description: request.description,
                category: request.category,
                location: request.location,
                timeframe: request.timeframe,
                budget_min: request.budget_min,
                budget_max: request.budget_max,
            },
        )
        .await?;

    Ok(Json(job))
}

/// Place a bid on an open job.
///
/// POST /api/jobs/:id/bids
#[axum::debug_handler]
async fn place_bid(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(job_id): Path<String>,
    Json(request): Json<PlaceBidRequest>,
) -> Result<Json<Bid>> {
    auth.require_role(UserRole::Professional)?;

    let bid = state
        .ledger
        .place_bid(
            &auth.user_id,
            &job_id,
            PlaceBid {
                amount: request.amount,
                message: request.message,
                estimated_duration: request.estimated_duration,
            },
        )
        .await?;

    Ok(Json(bid))
}

/// Mark an in-progress job completed.
///
/// POST /api/jobs/:id/complete
#[axum::debug_handler]
async fn complete_job(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(job_id): Path<String>,
) -> Result<Json<Job>> {
    auth.require_role(UserRole::Customer)?;
    let job = state.ledger.complete_job(&auth.user_id, &job_id).await?;
    Ok(Json(job))
}

/// Cancel an unfinished job.
///
/// POST /api/jobs/:id/cancel
#[axum::debug_handler]
async fn cancel_job(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(job_id): Path<String>,
) -> Result<Json<Job>> {
    auth.require_role(UserRole::Customer)?;
    let job = state.ledger.cancel_job(&auth.user_id, &job_id).await?;
    Ok(Json(job))
}
