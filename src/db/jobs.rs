//! Job ledger queries.
//!
//! Jobs advance forward only: open -> in_progress -> completed, with
//! cancellation allowed while open or in progress. Transitions are guarded
//! by conditional updates so a concurrent writer loses cleanly instead of
//! clobbering state. The accept-bid cascade lives in bids.rs.

use crate::models::JobStatus;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::DbPool;

/// Hard cap on open-job listings. No pagination beyond this.
pub const OPEN_JOBS_CAP: i64 = 50;

// ============================================================================
// Types
// ============================================================================

/// Job record.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub customer_id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub location: String,
    pub timeframe: String,
    pub budget_min: i64,
    pub budget_max: i64,
    pub status: String,
    pub bids_count: i64,
    pub selected_professional_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Job {
    pub fn status_enum(&self) -> JobStatus {
        JobStatus::from_str(&self.status)
    }

    pub fn is_open(&self) -> bool {
        self.status == "open"
    }
}

/// Input for creating a new job.
#[derive(Debug, Clone)]
pub struct CreateJob {
    pub id: String,
    pub customer_id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub location: String,
    pub timeframe: String,
    pub budget_min: i64,
    pub budget_max: i64,
}

// ============================================================================
// Queries
// ============================================================================

/// Create a new job with status=open and bids_count=0.
pub async fn create_job(pool: &DbPool, input: CreateJob) -> Result<Job> {
    sqlx::query_as::<_, Job>(
        r#"
        INSERT INTO jobs
            (id, customer_id, title, description, category, location,
             timeframe, budget_min, budget_max)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(&input.id)
    .bind(&input.customer_id)
    .bind(&input.title)
    .bind(&input.description)
    .bind(&input.category)
    .bind(&input.location)
    .bind(&input.timeframe)
    .bind(input.budget_min)
    .bind(input.budget_max)
    .fetch_one(pool)
    .await
    .map_err(Error::Database)
}

/// Get a job by ID.
pub async fn get_job(pool: &DbPool, id: &str) -> Result<Job> {
    sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Job not found: {}", id)))
}

/// List open jobs, newest first, with optional category filter.
/// Capped at OPEN_JOBS_CAP results.
pub async fn list_open_jobs(pool: &DbPool, category: Option<&str>) -> Result<Vec<Job>> {
    match category {
        Some(c) => sqlx::query_as::<_, Job>(
            r#"
            SELECT * FROM jobs
            WHERE status = 'open' AND category = ?
            ORDER BY created_at DESC
            LIMIT ?
            "#,
        )
        .bind(c)
        .bind(OPEN_JOBS_CAP)
        .fetch_all(pool)
        .await
        .map_err(Error::Database),
        None => sqlx::query_as::<_, Job>(
            r#"
            SELECT * FROM jobs
            WHERE status = 'open'
            ORDER BY created_at DESC
            LIMIT ?
            "#,
        )
        .bind(OPEN_JOBS_CAP)
        .fetch_all(pool)
        .await
        .map_err(Error::Database),
    }
}

/// List jobs posted by a customer, newest first.
pub async fn list_customer_jobs(pool: &DbPool, customer_id: &str) -> Result<Vec<Job>> {
    sqlx::query_as::<_, Job>(
        "SELECT * FROM jobs WHERE customer_id = ? ORDER BY created_at DESC",
    )
    .bind(customer_id)
    .fetch_all(pool)
    .await
    .map_err(Error::Database)
}

/// Mark an in-progress job completed. Conditional on current status.
pub async fn complete_job(pool: &DbPool, id: &str) -> Result<Job> {
    transition_job(pool, id, &["in_progress"], JobStatus::Completed).await
}

/// Cancel a job that has not finished. Conditional on current status.
pub async fn cancel_job(pool: &DbPool, id: &str) -> Result<Job> {
    transition_job(pool, id, &["open", "in_progress"], JobStatus::Cancelled).await
}

/// Guarded forward transition. Zero rows affected means the job was not in
/// an allowed source state, reported as Conflict (or NotFound if absent).
async fn transition_job(
    pool: &DbPool,
    id: &str,
    allowed_from: &[&str],
    to: JobStatus,
) -> Result<Job> {
    let placeholders = allowed_from.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
    let query = format!(
        r#"
        UPDATE jobs
        SET status = ?, updated_at = datetime('now')
        WHERE id = ? AND status IN ({})
        RETURNING *
        "#,
        placeholders
    );

    let mut q = sqlx::query_as::<_, Job>(&query).bind(to.as_str()).bind(id);
    for from in allowed_from {
        q = q.bind(*from);
    }

    match q.fetch_optional(pool).await? {
        Some(job) => Ok(job),
        None => {
            let current = get_job(pool, id).await?;
            Err(Error::Conflict(format!(
                "Job {} is {}, cannot move to {}",
                id,
                current.status,
                to.as_str()
            )))
        }
    }
}
