//! Professional application and signup token queries.
//!
//! Applications are never deleted; admin review only moves them between
//! pending, approved and rejected. Approval mints a one-time signup token
//! recorded in approved_professionals. The multi-row transitions (approve,
//! complete signup) run inside a single transaction.

use crate::models::ApplicationStatus;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::professionals::Professional;
use super::users::User;
use super::DbPool;

// ============================================================================
// Types
// ============================================================================

/// Professional application record.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Application {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub category: String,
    pub years_experience: i64,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub status: String,
    pub signup_token: Option<String>,
    pub reviewed_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Application {
    pub fn status_enum(&self) -> ApplicationStatus {
        ApplicationStatus::from_str(&self.status)
    }
}

/// Input for creating a new application.
#[derive(Debug, Clone)]
pub struct CreateApplication {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub category: String,
    pub years_experience: i64,
    pub bio: Option<String>,
    pub location: Option<String>,
}

/// One-time signup token record, minted at approval.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ApprovedProfessional {
    pub id: String,
    pub application_id: String,
    pub signup_token: String,
    pub email: String,
    pub used: bool,
    pub professional_id: Option<String>,
    pub expires_at: String,
    pub created_at: String,
}

// ============================================================================
// Application Queries
// ============================================================================

/// Create a new application with status=pending.
pub async fn create_application(pool: &DbPool, input: CreateApplication) -> Result<Application> {
    sqlx::query_as::<_, Application>(
        r#"
        INSERT INTO professional_applications
            (id, full_name, email, phone, category, years_experience, bio, location)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(&input.id)
    .bind(&input.full_name)
    .bind(&input.email)
    .bind(&input.phone)
    .bind(&input.category)
    .bind(input.years_experience)
    .bind(&input.bio)
    .bind(&input.location)
    .fetch_one(pool)
    .await
    .map_err(Error::Database)
}

/// Get an application by ID.
pub async fn get_application(pool: &DbPool, id: &str) -> Result<Application> {
    sqlx::query_as::<_, Application>("SELECT * FROM professional_applications WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Application not found: {}", id)))
}

/// Find an application by email, newest first.
/// Used by the best-effort duplicate pre-check on submission.
pub async fn find_application_by_email(pool: &DbPool, email: &str) -> Result<Option<Application>> {
    sqlx::query_as::<_, Application>(
        r#"
        SELECT * FROM professional_applications
        WHERE email = ?
        ORDER BY created_at DESC
        LIMIT 1
        "#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await
    .map_err(Error::Database)
}

/// List applications with optional status filter, newest first.
pub async fn list_applications(
    pool: &DbPool,
    status: Option<ApplicationStatus>,
) -> Result<Vec<Application>> {
    match status {
        Some(s) => sqlx::query_as::<_, Application>(
            r#"
            SELECT * FROM professional_applications
            WHERE status = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(s.as_str())
        .fetch_all(pool)
        .await
        .map_err(Error::Database),
        None => sqlx::query_as::<_, Application>(
            "SELECT * FROM professional_applications ORDER BY created_at DESC",
        )
        .fetch_all(pool)
        .await
        .map_err(Error::Database),
    }
}

/// Approve a pending application and mint its signup token record.
///
/// Runs in a single transaction: the application row moves to approved with
/// the token attached, and exactly one approved_professionals row is created
/// with used=0. Requires current status == pending; an already-reviewed
/// application returns Conflict.
pub async fn approve_application(
    pool: &DbPool,
    id: &str,
    token_record_id: &str,
    signup_token: &str,
    expires_at: DateTime<Utc>,
) -> Result<Application> {
    let mut tx = pool.begin().await?;

    let application = sqlx::query_as::<_, Application>(
        "SELECT * FROM professional_applications WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| Error::NotFound(format!("Application not found: {}", id)))?;

    if application.status_enum() != ApplicationStatus::Pending {
        return Err(Error::Conflict(format!(
            "Application {} is already {}",
            id, application.status
        )));
    }

    let approved = sqlx::query_as::<_, Application>(
        r#"
        UPDATE professional_applications
        SET status = 'approved',
            signup_token = ?,
            reviewed_at = datetime('now'),
            updated_at = datetime('now')
        WHERE id = ? AND status = 'pending'
        RETURNING *
        "#,
    )
    .bind(signup_token)
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO approved_professionals
            (id, application_id, signup_token, email, used, expires_at)
        VALUES (?, ?, ?, ?, 0, ?)
        "#,
    )
    .bind(token_record_id)
    .bind(id)
    .bind(signup_token)
    .bind(&approved.email)
    .bind(expires_at.to_rfc3339())
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(approved)
}

/// Reject a pending application.
///
/// Requires current status == pending, so rejecting twice fails with
/// Conflict instead of silently repeating the transition.
pub async fn reject_application(pool: &DbPool, id: &str) -> Result<Application> {
    let application = get_application(pool, id).await?;

    if application.status_enum() != ApplicationStatus::Pending {
        return Err(Error::Conflict(format!(
            "Application {} is already {}",
            id, application.status
        )));
    }

    sqlx::query_as::<_, Application>(
        r#"
        UPDATE professional_applications
        SET status = 'rejected',
            reviewed_at = datetime('now'),
            updated_at = datetime('now')
        WHERE id = ? AND status = 'pending'
        RETURNING *
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| Error::Conflict(format!("Application {} was reviewed concurrently", id)))
}

// ============================================================================
// Signup Token Queries
// ============================================================================

/// Get an unused, unexpired signup token record.
pub async fn get_signup_token(pool: &DbPool, token: &str) -> Result<Option<ApprovedProfessional>> {
    sqlx::query_as::<_, ApprovedProfessional>(
        r#"
        SELECT * FROM approved_professionals
        WHERE signup_token = ? AND used = 0 AND expires_at > ?
        "#,
    )
    .bind(token)
    .bind(Utc::now().to_rfc3339())
    .fetch_optional(pool)
    .await
    .map_err(Error::Database)
}

/// Input for completing signup against a token.
#[derive(Debug, Clone)]
pub struct CompleteSignup {
    pub user_id: String,
    pub password_hash: String,
}

/// Consume a signup token and create the professional account.
///
/// Runs in a single transaction: creates the users credential row, populates
/// the professionals profile from the original application, and marks the
/// token record used=1 with a back-reference to the new account. A consumed
/// or expired token fails with NotFound before any write.
pub async fn complete_signup(
    pool: &DbPool,
    token: &str,
    input: CompleteSignup,
) -> Result<(User, Professional)> {
    let mut tx = pool.begin().await?;

    let record = sqlx::query_as::<_, ApprovedProfessional>(
        r#"
        SELECT * FROM approved_professionals
        WHERE signup_token = ? AND used = 0 AND expires_at > ?
        "#,
    )
    .bind(token)
    .bind(Utc::now().to_rfc3339())
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| Error::NotFound("Invalid or expired signup token".to_string()))?;

    let application = sqlx::query_as::<_, Application>(
        "SELECT * FROM professional_applications WHERE id = ?",
    )
    .bind(&record.application_id)
    .fetch_one(&mut *tx)
    .await?;

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, email, password_hash, role, display_name)
        VALUES (?, ?, ?, 'professional', ?)
        RETURNING *
        "#,
    )
    .bind(&input.user_id)
    .bind(&record.email)
    .bind(&input.password_hash)
    .bind(&application.full_name)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            Error::AlreadyExists(format!("Account already exists for {}", record.email))
        }
        _ => Error::Database(e),
    })?;

    let professional = sqlx::query_as::<_, Professional>(
        r#"
        INSERT INTO professionals
            (user_id, application_id, full_name, email, phone, category,
             years_experience, bio, location, status, needs_onboarding)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 'approved', 0)
        RETURNING *
        "#,
    )
    .bind(&input.user_id)
    .bind(&application.id)
    .bind(&application.full_name)
    .bind(&application.email)
    .bind(&application.phone)
    .bind(&application.category)
    .bind(application.years_experience)
    .bind(&application.bio)
    .bind(&application.location)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        "UPDATE approved_professionals SET used = 1, professional_id = ? WHERE id = ?",
    )
    .bind(&input.user_id)
    .bind(&record.id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok((user, professional))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_memory_pool, migrate};
    use chrono::Duration;

    async fn setup_test_db() -> DbPool {
        let pool = init_memory_pool().await.unwrap();
        migrate(&pool).await.unwrap();
        pool
    }

    fn sample_application(id: &str, email: &str) -> CreateApplication {
        CreateApplication {
            id: id.to_string(),
            full_name: "Jane Doe".to_string(),
            email: email.to_string(),
            phone: Some("555-0100".to_string()),
            category: "plumbing".to_string(),
            years_experience: 8,
            bio: Some("Licensed plumber".to_string()),
            location: Some("Springfield".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_and_get_application() {
        let pool = setup_test_db().await;

        let app = create_application(&pool, sample_application("app-1", "jane@example.com"))
            .await
            .unwrap();
        assert_eq!(app.status, "pending");
        assert!(app.signup_token.is_none());

        let fetched = get_application(&pool, "app-1").await.unwrap();
        assert_eq!(fetched.full_name, "Jane Doe");
    }

    #[tokio::test]
    async fn test_approve_creates_one_token_record() {
        let pool = setup_test_db().await;
        create_application(&pool, sample_application("app-1", "jane@example.com"))
            .await
            .unwrap();

        let expires = Utc::now() + Duration::days(7);
        let approved = approve_application(&pool, "app-1", "tok-rec-1", "tok-secret", expires)
            .await
            .unwrap();

        assert_eq!(approved.status, "approved");
        assert_eq!(approved.signup_token.as_deref(), Some("tok-secret"));

        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM approved_professionals WHERE signup_token = 'tok-secret' AND used = 0",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(count.0, 1);
    }

    #[tokio::test]
    async fn test_approve_requires_pending() {
        let pool = setup_test_db().await;
        create_application(&pool, sample_application("app-1", "jane@example.com"))
            .await
            .unwrap();

        let expires = Utc::now() + Duration::days(7);
        approve_application(&pool, "app-1", "tok-rec-1", "tok-1", expires)
            .await
            .unwrap();

        let err = approve_application(&pool, "app-1", "tok-rec-2", "tok-2", expires)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));

        // The failed second approval must not leave a second token record.
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM approved_professionals")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(count.0, 1);
    }

    #[tokio::test]
    async fn test_reject_twice_fails_precondition() {
        let pool = setup_test_db().await;
        create_application(&pool, sample_application("app-1", "jane@example.com"))
            .await
            .unwrap();

        let rejected = reject_application(&pool, "app-1").await.unwrap();
        assert_eq!(rejected.status, "rejected");

        let err = reject_application(&pool, "app-1").await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[tokio::test]
    async fn test_signup_token_single_use() {
        let pool = setup_test_db().await;
        create_application(&pool, sample_application("app-1", "jane@example.com"))
            .await
            .unwrap();

        let expires = Utc::now() + Duration::days(7);
        approve_application(&pool, "app-1", "tok-rec-1", "tok-secret", expires)
            .await
            .unwrap();

        let (user, professional) = complete_signup(
            &pool,
            "tok-secret",
            CompleteSignup {
                user_id: "user-1".to_string(),
                password_hash: "hash".to_string(),
            },
        )
        .await
        .unwrap();

        assert_eq!(user.email, "jane@example.com");
        assert_eq!(user.role, "professional");
        assert_eq!(professional.status, "approved");
        assert!(!professional.needs_onboarding);

        // Second use of the same token fails as not-found.
        let err = complete_signup(
            &pool,
            "tok-secret",
            CompleteSignup {
                user_id: "user-2".to_string(),
                password_hash: "hash".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_expired_token_rejected() {
        let pool = setup_test_db().await;
        create_application(&pool, sample_application("app-1", "jane@example.com"))
            .await
            .unwrap();

        let expires = Utc::now() - Duration::days(1);
        approve_application(&pool, "app-1", "tok-rec-1", "tok-stale", expires)
            .await
            .unwrap();

        assert!(get_signup_token(&pool, "tok-stale").await.unwrap().is_none());

        let err = complete_signup(
            &pool,
            "tok-stale",
            CompleteSignup {
                user_id: "user-1".to_string(),
                password_hash: "hash".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
