//! Professional profile queries.
//!
//! Profiles are keyed by the auth user id and mirror the application
//! outcome. Full profile fields appear only after signup-token completion
//! (the insert happens inside applications::complete_signup).

use crate::models::ApplicationStatus;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::DbPool;

/// Professional profile record.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Professional {
    pub user_id: String,
    pub application_id: Option<String>,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub category: String,
    pub years_experience: i64,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub status: String,
    pub needs_onboarding: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl Professional {
    pub fn is_approved(&self) -> bool {
        ApplicationStatus::from_str(&self.status) == ApplicationStatus::Approved
    }
}

/// Get a professional profile by user ID.
pub async fn get_professional(pool: &DbPool, user_id: &str) -> Result<Professional> {
    sqlx::query_as::<_, Professional>("SELECT * FROM professionals WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Professional profile not found: {}", user_id)))
}

/// Get a professional profile if one exists.
pub async fn find_professional(pool: &DbPool, user_id: &str) -> Result<Option<Professional>> {
    sqlx::query_as::<_, Professional>("SELECT * FROM professionals WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(Error::Database)
}

/// List professionals with optional category filter, newest first.
pub async fn list_professionals(
    pool: &DbPool,
    category: Option<&str>,
) -> Result<Vec<Professional>> {
    match category {
        Some(c) => sqlx::query_as::<_, Professional>(
            r#"
            SELECT * FROM professionals
            WHERE category = ? AND status = 'approved'
            ORDER BY created_at DESC
            "#,
        )
        .bind(c)
        .fetch_all(pool)
        .await
        .map_err(Error::Database),
        None => sqlx::query_as::<_, Professional>(
            "SELECT * FROM professionals WHERE status = 'approved' ORDER BY created_at DESC",
        )
        .fetch_all(pool)
        .await
        .map_err(Error::Database),
    }
}
