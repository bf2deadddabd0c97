//! API Routes for Workbridge
//!
//! This module combines all API routes into a single router.
//! Routes are organized by domain and apply appropriate middleware.

mod auth;
mod bids;
mod jobs;
mod professionals;
pub mod status;

use axum::Router;

use crate::AppState;

/// Build the complete API router.
///
/// Route structure:
/// - /health - Health check (public)
/// - /register/custom, /login/custom - Custom auth (public)
/// - /api/professional/* - Application lifecycle (mixed public/admin)
/// - /api/jobs/*, /api/bids/* - Job/bid ledger (reads public, writes token-protected)
pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health endpoint (public)
        .merge(status::routes())
        // Custom auth (public)
        .merge(auth::routes())
        // Application lifecycle (public submission + admin review)
        .nest("/api/professional", professionals::routes(state.clone()))
        // Job/bid ledger
        .nest("/api/jobs", jobs::routes(state.clone()))
        .nest("/api/bids", bids::routes(state))
}
