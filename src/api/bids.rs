//! Bid Routes
//!
//! Routes:
//! - POST /api/bids/:id/accept - Accept a bid, cascading the outcome (customer)
//! - POST /api/bids/:id/withdraw - Withdraw a pending bid (professional)

use axum::{
    extract::{Path, State},
    routing::post,
    Extension, Json, Router,
};
use serde::Serialize;

use crate::db::Bid;
use crate::middleware::{require_token, AuthContext};
use crate::models::UserRole;
use crate::{AppState, Result};

/// Build bid routes.
pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/:bid_id/accept", post(accept_bid))
        .route("/:bid_id/withdraw", post(withdraw_bid))
        .layer(axum::middleware::from_fn_with_state(state, require_token))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Accept-bid response: the winning bid plus the cascade summary.
#[derive(Debug, Serialize)]
pub struct AcceptBidResponse {
    pub bid: Bid,
    pub job_id: String,
    pub job_status: String,
    pub selected_professional_id: Option<String>,
    pub rejected_bids: usize,
}

// ============================================================================
// Handlers
// ============================================================================

/// Accept a bid on behalf of the job's customer.
///
/// POST /api/bids/:id/accept
#[axum::debug_handler]
async fn accept_bid(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(bid_id): Path<String>,
) -> Result<Json<AcceptBidResponse>> {
    auth.require_role(UserRole::Customer)?;

    let result = state.ledger.accept_bid(&auth.user_id, &bid_id).await?;

    Ok(Json(AcceptBidResponse {
        bid: result.bid,
        job_id: result.job.id,
        job_status: result.job.status,
        selected_professional_id: result.job.selected_professional_id,
        rejected_bids: result.rejected.len(),
    }))
}

/// Withdraw a pending bid.
///
/// POST /api/bids/:id/withdraw
#[axum::debug_handler]
async fn withdraw_bid(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(bid_id): Path<String>,
) -> Result<Json<Bid>> {
    auth.require_role(UserRole::Professional)?;
    let bid = state.ledger.withdraw_bid(&auth.user_id, &bid_id).await?;
    Ok(Json(bid))
}
