//! Outbound email audit queries.
//!
//! Every dispatch attempt is recorded, successful or not. There is no
//! retry machinery; the rows exist for manual reconciliation.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::DbPool;

/// Notification audit record.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub recipient: String,
    pub subject: String,
    pub kind: String,
    pub status: String,
    pub error: Option<String>,
    pub created_at: String,
}

/// Input for recording a dispatch attempt.
#[derive(Debug, Clone)]
pub struct CreateNotification {
    pub id: String,
    pub recipient: String,
    pub subject: String,
    pub kind: String,
    pub status: String,
    pub error: Option<String>,
}

/// Record a dispatch attempt.
pub async fn create_notification(
    pool: &DbPool,
    input: CreateNotification,
) -> Result<Notification> {
    sqlx::query_as::<_, Notification>(
        r#"
        INSERT INTO notifications (id, recipient, subject, kind, status, error)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(&input.id)
    .bind(&input.recipient)
    .bind(&input.subject)
    .bind(&input.kind)
    .bind(&input.status)
    .bind(&input.error)
    .fetch_one(pool)
    .await
    .map_err(Error::Database)
}

/// List dispatch attempts for a recipient, newest first.
/// Uses idx_notifications_recipient index.
pub async fn list_notifications(pool: &DbPool, recipient: &str) -> Result<Vec<Notification>> {
    sqlx::query_as::<_, Notification>(
        r#"
        SELECT * FROM notifications
        WHERE recipient = ?
        ORDER BY created_at DESC
        "#,
    )
    .bind(recipient)
    .fetch_all(pool)
    .await
    .map_err(Error::Database)
}
