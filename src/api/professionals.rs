//! Professional Application Routes
//!
//! Routes:
//! - POST /api/professional/submit-application - Submit an application (public)
//! - GET  /api/professional/signup?token=T - Resolve a signup token (public)
//! - POST /api/professional/complete-signup - Consume a token, create the account (public)
//! - GET  /api/professional/applications - List applications (admin)
//! - GET  /api/professional/applications/:id - Get one application (admin)
//! - POST /api/professional/applications/:id/approve - Approve (admin)
//! - POST /api/professional/applications/:id/reject - Reject (admin)
//! - POST /api/professional/admin-notification - Re-send admin alert (admin)
//! - POST /api/professional/confirmation-email - Re-send confirmation (admin)
//! - POST /api/professional/approval-email - Re-send approval mail (admin)
//! - POST /api/professional/rejection-email - Re-send rejection mail (admin)

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::db::Application;
use crate::middleware::{require_token, AuthContext};
use crate::models::ApplicationStatus;
use crate::services::{templates, SignupPrefill, SubmitApplication};
use crate::{AppState, Error, Result};

/// Build professional application routes.
pub fn routes(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/submit-application", post(submit_application))
        .route("/signup", get(resolve_signup_token))
        .route("/complete-signup", post(complete_signup));

    let admin = Router::new()
        .route("/applications", get(list_applications))
        .route("/applications/:application_id", get(get_application))
        .route("/applications/:application_id/approve", post(approve_application))
        .route("/applications/:application_id/reject", post(reject_application))
        .route("/admin-notification", post(send_admin_notification))
        .route("/confirmation-email", post(send_confirmation_email))
        .route("/approval-email", post(send_approval_email))
        .route("/rejection-email", post(send_rejection_email))
        .layer(axum::middleware::from_fn_with_state(state, require_token));

    public.merge(admin)
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Application submission request.
#[derive(Debug, Deserialize)]
pub struct SubmitApplicationRequest {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub category: String,
    #[serde(default)]
    pub years_experience: i64,
    pub bio: Option<String>,
    pub location: Option<String>,
}

/// Query parameters for resolving a signup token.
#[derive(Debug, Deserialize)]
pub struct SignupTokenQuery {
    pub token: String,
}

/// Signup completion request.
#[derive(Debug, Deserialize)]
pub struct CompleteSignupRequest {
    pub token: String,
    pub password: String,
}

/// Signup completion response.
#[derive(Debug, Serialize)]
pub struct CompleteSignupResponse {
    pub user_id: String,
    pub email: String,
    pub status: String,
    pub needs_onboarding: bool,
}

/// Query parameters for listing applications.
#[derive(Debug, Deserialize, Default)]
pub struct ListApplicationsQuery {
    /// Filter by status
    pub status: Option<ApplicationStatus>,
}

/// Request for the direct email dispatch endpoints.
#[derive(Debug, Deserialize)]
pub struct DispatchEmailRequest {
    pub application_id: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// Submit a new professional application.
///
/// POST /api/professional/submit-application
#[axum::debug_handler]
async fn submit_application(
    State(state): State<AppState>,
    Json(request): Json<SubmitApplicationRequest>,
) -> Result<Json<Application>> {
    let application = state
        .applications
        .submit(SubmitApplication {
            full_name: request.full_name,
            email: request.email,
            phone: request.phone,
            category: request.category,
            years_experience: request.years_experience,
            bio: request.bio,
            location: request.location,
        })
        .await?;

    Ok(Json(application))
}

/// Resolve a signup token to applicant details for prefill.
///
/// GET /api/professional/signup?token=T
#[axum::debug_handler]
async fn resolve_signup_token(
    State(state): State<AppState>,
    Query(query): Query<SignupTokenQuery>,
) -> Result<Json<SignupPrefill>> {
    let prefill = state.applications.resolve_token(&query.token).await?;
    Ok(Json(prefill))
}

/// Complete signup against a one-time token.
///
/// POST /api/professional/complete-signup
#[axum::debug_handler]
async fn complete_signup(
    State(state): State<AppState>,
    Json(request): Json<CompleteSignupRequest>,
) -> Result<Json<CompleteSignupResponse>> {
    let (user, professional) = state
        .applications
        .complete_signup(&request.token, &request.password)
        .await?;

    Ok(Json(CompleteSignupResponse {
        user_id: user.id,
        email: user.email,
        status: professional.status,
        needs_onboarding: professional.needs_onboarding,
    }))
}

/// List applications for the review queue.
///
/// GET /api/professional/applications
#[axum::debug_handler]
async fn list_applications(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListApplicationsQuery>,
) -> Result<Json<Vec<Application>>> {
    auth.require_admin()?;
    let applications = state.applications.list(query.status).await?;
    Ok(Json(applications))
}

/// Get one application.
///
/// GET /api/professional/applications/:id
#[axum::debug_handler]
async fn get_application(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(application_id): Path<String>,
) -> Result<Json<Application>> {
    auth.require_admin()?;
    let application = state.applications.get(&application_id).await?;
    Ok(Json(application))
}

/// Approve a pending application.
///
/// POST /api/professional/applications/:id/approve
#[axum::debug_handler]
async fn approve_application(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(application_id): Path<String>,
) -> Result<Json<Application>> {
    auth.require_admin()?;
    let application = state.applications.approve(&application_id).await?;
    Ok(Json(application))
}

/// Reject a pending application.
///
/// POST /api/professional/applications/:id/reject
#[axum::debug_handler]
async fn reject_application(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(application_id): Path<String>,
) -> Result<Json<Application>> {
    auth.require_admin()?;
    let application = state.applications.reject(&application_id).await?;
    Ok(Json(application))
}

// ============================================================================
// Direct email dispatch
//
// The lifecycle operations send these mails inline; these endpoints let an
// admin re-trigger delivery for a given application.
// ============================================================================

/// Re-send the new-application admin alert.
///
/// POST /api/professional/admin-notification
#[axum::debug_handler]
async fn send_admin_notification(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<DispatchEmailRequest>,
) -> Result<Json<serde_json::Value>> {
    auth.require_admin()?;
    let application = state.applications.get(&request.application_id).await?;

    let admin = state.mailer.admin_address().to_string();
    state
        .mailer
        .send(
            &admin,
            "admin_alert",
            &templates::admin_alert(
                &application.full_name,
                &application.email,
                &application.category,
            ),
        )
        .await?;

    Ok(Json(serde_json::json!({ "sent": true })))
}

/// Re-send the submission confirmation to the applicant.
///
/// POST /api/professional/confirmation-email
#[axum::debug_handler]
async fn send_confirmation_email(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<DispatchEmailRequest>,
) -> Result<Json<serde_json::Value>> {
    auth.require_admin()?;
    let application = state.applications.get(&request.application_id).await?;

    state
        .mailer
        .send(
            &application.email,
            "confirmation",
            &templates::application_confirmation(&application.full_name),
        )
        .await?;

    Ok(Json(serde_json::json!({ "sent": true })))
}

/// Re-send the approval mail with the signup link.
///
/// POST /api/professional/approval-email
#[axum::debug_handler]
async fn send_approval_email(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<DispatchEmailRequest>,
) -> Result<Json<serde_json::Value>> {
    auth.require_admin()?;
    let application = state.applications.get(&request.application_id).await?;

    // Only approved applications carry a signup token to re-send.
    let token = application
        .signup_token
        .as_deref()
        .ok_or_else(|| Error::Conflict(format!(
            "Application {} has no signup token",
            application.id
        )))?;

    let signup_url = format!(
        "{}/signup?token={}",
        crate::config::config().server.public_url,
        token
    );
    state
        .mailer
        .send(
            &application.email,
            "approval",
            &templates::application_approved(&application.full_name, &signup_url),
        )
        .await?;

    Ok(Json(serde_json::json!({ "sent": true })))
}

/// Re-send the rejection mail.
///
/// POST /api/professional/rejection-email
#[axum::debug_handler]
async fn send_rejection_email(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<DispatchEmailRequest>,
) -> Result<Json<serde_json::Value>> {
    auth.require_admin()?;
    let application = state.applications.get(&request.application_id).await?;

    if application.status_enum() != ApplicationStatus::Rejected {
        return Err(Error::Conflict(format!(
            "Application {} is not rejected",
            application.id
        )));
    }

    state
        .mailer
        .send(
            &application.email,
            "rejection",
            &templates::application_rejected(&application.full_name),
        )
        .await?;

    Ok(Json(serde_json::json!({ "sent": true })))
}
