//! Custom authentication service.
//!
//! Registration and login over the users table; both issue an opaque
//! bearer token valid for the configured window (7 days by default).

use chrono::{DateTime, Duration, Utc};
use tracing::info;

use crate::config::AuthConfig;
use crate::db::{self, DbPool, User};
use crate::models::{new_id, UserRole};
use crate::validation;
use crate::{Error, Result};

use super::tokens;

/// A successful register/login outcome.
#[derive(Debug, Clone)]
pub struct AuthOutcome {
    pub user: User,
    /// Plaintext bearer token; only returned here, never stored.
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Service for account registration and login.
#[derive(Clone)]
pub struct AuthService {
    db: DbPool,
    token_ttl_days: i64,
}

impl AuthService {
    pub fn new(db: DbPool, config: &AuthConfig) -> Self {
        Self {
            db,
            token_ttl_days: config.token_ttl_days,
        }
    }

    /// Register a new customer account and issue a bearer token.
    ///
    /// Professional accounts are not created here; they come out of the
    /// application approval flow (complete_signup).
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: Option<String>,
    ) -> Result<AuthOutcome> {
        validation::validate_credentials(email, password)?;

        let user = db::create_user(
            &self.db,
            db::CreateUser {
                id: new_id(),
                email: email.to_string(),
                password_hash: tokens::hash_password(password),
                role: UserRole::Customer,
                display_name,
            },
        )
        .await?;

        info!("Registered account {}", user.id);
        self.issue_token(user).await
    }

    /// Verify credentials and issue a bearer token.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthOutcome> {
        let user = db::get_user_by_email(&self.db, email)
            .await?
            .ok_or(Error::InvalidCredentials)?;

        if !tokens::verify_password(password, &user.password_hash) {
            return Err(Error::InvalidCredentials);
        }

        db::update_last_login(&self.db, &user.id).await?;
        self.issue_token(user).await
    }

    /// Mint and persist a bearer token for an authenticated user.
    pub async fn issue_token(&self, user: User) -> Result<AuthOutcome> {
        let minted = tokens::mint_bearer_token();
        let expires_at = Utc::now() + Duration::days(self.token_ttl_days);

        db::create_api_token(
            &self.db,
            db::CreateApiToken {
                id: new_id(),
                user_id: user.id.clone(),
                token_prefix: minted.prefix,
                token_hash: minted.hash,
                expires_at,
            },
        )
        .await?;

        Ok(AuthOutcome {
            user,
            token: minted.plaintext,
            expires_at,
        })
    }
}
