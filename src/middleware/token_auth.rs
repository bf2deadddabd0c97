//! Bearer token authentication middleware.
//!
//! Validates `Authorization: Bearer wb_{prefix}_{secret}` headers. The
//! prefix drives an indexed lookup; the full token is verified against the
//! stored SHA-256 hash with a timing-safe comparison. On success an
//! `AuthContext` is injected into request extensions, so handlers receive
//! an explicit per-request identity instead of any process-wide state.

use axum::{
    body::Body,
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::models::UserRole;
use crate::services::tokens::{bearer_lookup_prefix, constant_time_eq, hash_token};
use crate::{db, error::Error, AppState};

/// Authentication context injected into request extensions after
/// successful token validation.
#[derive(Clone, Debug)]
pub struct AuthContext {
    /// User that owns the presented token.
    pub user_id: String,
    /// Role at validation time.
    pub role: UserRole,
}

impl AuthContext {
    /// Admin-only guard for handlers.
    pub fn require_admin(&self) -> Result<(), Error> {
        if self.role != UserRole::Admin {
            return Err(Error::Forbidden);
        }
        Ok(())
    }

    /// Role guard for handlers. Admins pass every check.
    pub fn require_role(&self, role: UserRole) -> Result<(), Error> {
        if self.role != role && self.role != UserRole::Admin {
            return Err(Error::Forbidden);
        }
        Ok(())
    }
}

/// Extract the bearer token from the Authorization header.
fn extract_token(req: &Request<Body>) -> Option<String> {
    let auth_header = req.headers().get(AUTHORIZATION)?;
    let auth_str = auth_header.to_str().ok()?;
    auth_str.strip_prefix("Bearer ").map(|t| t.to_string())
}

/// Middleware that requires a valid bearer token.
///
/// Returns 401 if the header is missing, the token is malformed or
/// unknown, the hash does not match, or the token has expired.
pub async fn require_token(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, Error> {
    let token = extract_token(&req).ok_or(Error::Unauthenticated)?;

    let auth_context = validate_token(&state, &token).await?;

    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}

/// Validate a token string and return the auth context.
async fn validate_token(state: &AppState, token: &str) -> Result<AuthContext, Error> {
    let prefix = bearer_lookup_prefix(token).ok_or(Error::InvalidToken)?;

    let presented_hash = hash_token(token);

    // Prefix collisions are possible, so check every candidate.
    let candidates = db::get_api_tokens_by_prefix(&state.db, prefix).await?;
    let matched = candidates
        .into_iter()
        .find(|c| constant_time_eq(&c.token_hash, &presented_hash))
        .ok_or(Error::InvalidToken)?;

    if matched.is_expired() {
        return Err(Error::TokenExpired);
    }

    let user = db::get_user(&state.db, &matched.user_id).await?;

    // Update last_used without blocking the request.
    let pool = state.db.clone();
    let token_id = matched.id.clone();
    tokio::spawn(async move {
        let _ = db::update_api_token_last_used(&pool, &token_id).await;
    });

    Ok(AuthContext {
        user_id: user.id.clone(),
        role: user.role_enum(),
    })
}
