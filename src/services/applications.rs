//! Application lifecycle manager.
//!
//! Drives a professional application through pending -> approved/rejected
//! and the approved applicant through one-time-token signup. Store writes
//! for the multi-row transitions are transactional (db::applications);
//! email dispatch happens after commit and is never part of the
//! transaction.

use chrono::{Duration, Utc};
use tracing::{info, warn};

use crate::db::{self, Application, DbPool, Professional, User};
use crate::models::{new_id, ApplicationStatus};
use crate::validation;
use crate::{Error, Result};

use super::mailer::Mailer;
use super::templates;
use super::tokens;

/// Input for a new application submission.
#[derive(Debug, Clone)]
pub struct SubmitApplication {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub category: String,
    pub years_experience: i64,
    pub bio: Option<String>,
    pub location: Option<String>,
}

/// Applicant details resolved from an unused signup token,
/// used to prefill the signup page.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SignupPrefill {
    pub full_name: String,
    pub email: String,
    pub category: String,
}

/// Service owning the application lifecycle.
#[derive(Clone)]
pub struct ApplicationService {
    db: DbPool,
    mailer: Mailer,
    public_url: String,
    signup_token_ttl_days: i64,
}

impl ApplicationService {
    pub fn new(
        db: DbPool,
        mailer: Mailer,
        public_url: String,
        signup_token_ttl_days: i64,
    ) -> Self {
        Self {
            db,
            mailer,
            public_url,
            signup_token_ttl_days,
        }
    }

    /// Submit a new application.
    ///
    /// The duplicate pre-check by email is best-effort: a pre-check failure
    /// is logged and does not block the submission. The dual notification
    /// (admin alert + applicant confirmation) is fire-and-forget.
    pub async fn submit(&self, input: SubmitApplication) -> Result<Application> {
        validation::validate_application(
            &input.full_name,
            &input.email,
            &input.category,
            input.years_experience,
        )?;

        match db::find_application_by_email(&self.db, &input.email).await {
            Ok(Some(existing)) if existing.status_enum() == ApplicationStatus::Pending => {
                return Err(Error::AlreadyExists(format!(
                    "An application for {} is already pending review",
                    input.email
                )));
            }
            Ok(_) => {}
            Err(e) => warn!("Duplicate pre-check failed, continuing: {}", e),
        }

        let application = db::create_application(
            &self.db,
            db::CreateApplication {
                id: new_id(),
                full_name: input.full_name,
                email: input.email,
                phone: input.phone,
                category: input.category,
                years_experience: input.years_experience,
                bio: input.bio,
                location: input.location,
            },
        )
        .await?;

        info!("Application {} submitted by {}", application.id, application.email);

        self.mailer
            .send_best_effort(
                &application.email,
                "confirmation",
                &templates::application_confirmation(&application.full_name),
            )
            .await;
        let admin = self.mailer.admin_address().to_string();
        self.mailer
            .send_best_effort(
                &admin,
                "admin_alert",
                &templates::admin_alert(
                    &application.full_name,
                    &application.email,
                    &application.category,
                ),
            )
            .await;

        Ok(application)
    }

    /// Approve a pending application.
    ///
    /// Mints a 256-bit signup token with an expiry, records it atomically
    /// with the status change, then emails the one-time signup link. The
    /// state is already committed if the email fails; the mail error
    /// surfaces so the admin can re-trigger delivery.
    pub async fn approve(&self, application_id: &str) -> Result<Application> {
        let token = tokens::generate_signup_token();
        let expires_at = Utc::now() + Duration::days(self.signup_token_ttl_days);

        let application =
            db::approve_application(&self.db, application_id, &new_id(), &token, expires_at)
                .await?;

        info!("Application {} approved", application.id);

        let signup_url = self.signup_url(&token);
        self.mailer
            .send(
                &application.email,
                "approval",
                &templates::application_approved(&application.full_name, &signup_url),
            )
            .await?;

        Ok(application)
    }

    /// Reject a pending application. A second reject fails the
    /// status==pending precondition instead of re-sending the email.
    pub async fn reject(&self, application_id: &str) -> Result<Application> {
        let application = db::reject_application(&self.db, application_id).await?;

        info!("Application {} rejected", application.id);

        self.mailer
            .send(
                &application.email,
                "rejection",
                &templates::application_rejected(&application.full_name),
            )
            .await?;

        Ok(application)
    }

    /// Resolve an unused, unexpired signup token to applicant details.
    pub async fn resolve_token(&self, token: &str) -> Result<SignupPrefill> {
        let record = db::get_signup_token(&self.db, token)
            .await?
            .ok_or_else(|| Error::NotFound("Invalid or expired signup token".to_string()))?;

        let application = db::get_application(&self.db, &record.application_id).await?;

        Ok(SignupPrefill {
            full_name: application.full_name,
            email: application.email,
            category: application.category,
        })
    }

    /// Consume a signup token: create the credential, populate the profile
    /// from the application, and mark the token used, all in one
    /// transaction. A consumed or expired token fails with NotFound.
    pub async fn complete_signup(
        &self,
        token: &str,
        password: &str,
    ) -> Result<(User, Professional)> {
        if password.len() < 8 {
            return Err(Error::Validation(
                "password must be at least 8 characters".to_string(),
            ));
        }

        let (user, professional) = db::complete_signup(
            &self.db,
            token,
            db::CompleteSignup {
                user_id: new_id(),
                password_hash: tokens::hash_password(password),
            },
        )
        .await?;

        info!("Professional account {} created from application", user.id);

        Ok((user, professional))
    }

    /// List applications for the admin review queue.
    pub async fn list(&self, status: Option<ApplicationStatus>) -> Result<Vec<Application>> {
        db::list_applications(&self.db, status).await
    }

    /// Get one application.
    pub async fn get(&self, id: &str) -> Result<Application> {
        db::get_application(&self.db, id).await
    }

    fn signup_url(&self, token: &str) -> String {
        format!("{}/signup?token={}", self.public_url, token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MailConfig;
    use crate::db::{init_memory_pool, migrate};

    async fn setup() -> ApplicationService {
        let pool = init_memory_pool().await.unwrap();
        migrate(&pool).await.unwrap();

        // Log-only mailer: no provider configured.
        let mailer = Mailer::new(
            pool.clone(),
            &MailConfig {
                provider_url: None,
                api_key: None,
                from_address: "noreply@test".to_string(),
                admin_address: "admin@test".to_string(),
            },
        );

        ApplicationService::new(pool, mailer, "http://localhost:8080".to_string(), 7)
    }

    fn jane() -> SubmitApplication {
        SubmitApplication {
            full_name: "Jane Doe".to_string(),
            email: "jane@example.com".to_string(),
            phone: None,
            category: "plumbing".to_string(),
            years_experience: 8,
            bio: None,
            location: Some("Springfield".to_string()),
        }
    }

    #[tokio::test]
    async fn test_full_signup_scenario() {
        let service = setup().await;

        // Submit -> approve -> resolve token -> complete signup
        let application = service.submit(jane()).await.unwrap();
        assert_eq!(application.status, "pending");

        let approved = service.approve(&application.id).await.unwrap();
        let token = approved.signup_token.clone().unwrap();
        assert!(!token.is_empty());

        let prefill = service.resolve_token(&token).await.unwrap();
        assert_eq!(prefill.full_name, "Jane Doe");

        let (user, professional) = service
            .complete_signup(&token, "a-strong-password")
            .await
            .unwrap();
        assert_eq!(user.email, "jane@example.com");
        assert_eq!(professional.status, "approved");
        assert!(!professional.needs_onboarding);

        // Token is spent: both resolve and reuse fail.
        assert!(matches!(
            service.resolve_token(&token).await.unwrap_err(),
            Error::NotFound(_)
        ));
        assert!(matches!(
            service
                .complete_signup(&token, "another-password")
                .await
                .unwrap_err(),
            Error::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_duplicate_pending_submission_rejected() {
        let service = setup().await;

        service.submit(jane()).await.unwrap();
        let err = service.submit(jane()).await.unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_reject_is_not_repeatable() {
        let service = setup().await;

        let application = service.submit(jane()).await.unwrap();
        service.reject(&application.id).await.unwrap();

        let err = service.reject(&application.id).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[tokio::test]
    async fn test_invalid_submission_never_written() {
        let service = setup().await;

        let mut bad = jane();
        bad.email = "not-an-email".to_string();
        assert!(matches!(
            service.submit(bad).await.unwrap_err(),
            Error::Validation(_)
        ));

        assert!(service.list(None).await.unwrap().is_empty());
    }
}
