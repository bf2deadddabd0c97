//! Bid queries and the accept-bid cascade.
//!
//! Placing a bid and accepting a bid are the two multi-row writes in the
//! ledger; both run inside a single transaction. The bids_count increment
//! is a relative UPDATE, not read-then-write, so concurrent bids cannot
//! lose updates.

use crate::models::BidStatus;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::jobs::Job;
use super::DbPool;

// ============================================================================
// Types
// ============================================================================

/// Bid record.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Bid {
    pub id: String,
    pub job_id: String,
    pub professional_id: String,
    pub amount: i64,
    pub message: Option<String>,
    pub estimated_duration: Option<String>,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Bid {
    pub fn status_enum(&self) -> BidStatus {
        BidStatus::from_str(&self.status)
    }
}

/// Input for placing a bid.
#[derive(Debug, Clone)]
pub struct CreateBid {
    pub id: String,
    pub job_id: String,
    pub professional_id: String,
    pub amount: i64,
    pub message: Option<String>,
    pub estimated_duration: Option<String>,
}

/// Result of a successful accept-bid cascade.
#[derive(Debug, Clone)]
pub struct AcceptedBid {
    pub job: Job,
    pub bid: Bid,
    /// Competing bids that were moved pending -> rejected.
    pub rejected: Vec<Bid>,
}

// ============================================================================
// Queries
// ============================================================================

/// Get a bid by ID.
pub async fn get_bid(pool: &DbPool, id: &str) -> Result<Bid> {
    sqlx::query_as::<_, Bid>("SELECT * FROM bids WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Bid not found: {}", id)))
}

/// List bids for a job, newest first.
/// Uses idx_bids_job index.
pub async fn list_job_bids(pool: &DbPool, job_id: &str) -> Result<Vec<Bid>> {
    sqlx::query_as::<_, Bid>("SELECT * FROM bids WHERE job_id = ? ORDER BY created_at DESC")
        .bind(job_id)
        .fetch_all(pool)
        .await
        .map_err(Error::Database)
}

/// List bids placed by a professional, newest first.
pub async fn list_professional_bids(pool: &DbPool, professional_id: &str) -> Result<Vec<Bid>> {
    sqlx::query_as::<_, Bid>(
        "SELECT * FROM bids WHERE professional_id = ? ORDER BY created_at DESC",
    )
    .bind(professional_id)
    .fetch_all(pool)
    .await
    .map_err(Error::Database)
}

/// Place a bid on an open job.
///
/// Runs in a single transaction: verifies the job is open, rejects a second
/// pending bid from the same professional, inserts the bid and bumps the
/// job's bids_count with a relative increment.
pub async fn place_bid(pool: &DbPool, input: CreateBid) -> Result<Bid> {
    let mut tx = pool.begin().await?;

    let job = sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = ?")
        .bind(&input.job_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Job not found: {}", input.job_id)))?;

    if !job.is_open() {
        return Err(Error::Conflict(format!(
            "Job {} is {}, not accepting bids",
            job.id, job.status
        )));
    }

    let existing: Option<(String,)> = sqlx::query_as(
        r#"
        SELECT id FROM bids
        WHERE job_id = ? AND professional_id = ? AND status = 'pending'
        "#,
    )
    .bind(&input.job_id)
    .bind(&input.professional_id)
    .fetch_optional(&mut *tx)
    .await?;

    if existing.is_some() {
        return Err(Error::AlreadyExists(format!(
            "A pending bid on job {} already exists",
            input.job_id
        )));
    }

    let bid = sqlx::query_as::<_, Bid>(
        r#"
        INSERT INTO bids (id, job_id, professional_id, amount, message, estimated_duration)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(&input.id)
    .bind(&input.job_id)
    .bind(&input.professional_id)
    .bind(input.amount)
    .bind(&input.message)
    .bind(&input.estimated_duration)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        "UPDATE jobs SET bids_count = bids_count + 1, updated_at = datetime('now') WHERE id = ?",
    )
    .bind(&input.job_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(bid)
}

/// Accept a bid and cascade the outcome.
///
/// Runs in a single transaction:
/// - the job moves open -> in_progress with the winning professional
///   recorded, guarded by `WHERE status = 'open'` so a concurrent accept on
///   the same job loses with Conflict and leaves the winner untouched;
/// - the target bid moves pending -> accepted;
/// - every other pending bid on the job moves to rejected.
pub async fn accept_bid(pool: &DbPool, bid_id: &str) -> Result<AcceptedBid> {
    let mut tx = pool.begin().await?;

    let bid = sqlx::query_as::<_, Bid>("SELECT * FROM bids WHERE id = ?")
        .bind(bid_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Bid not found: {}", bid_id)))?;

    if bid.status_enum() != BidStatus::Pending {
        return Err(Error::Conflict(format!(
            "Bid {} is {}, cannot accept",
            bid_id, bid.status
        )));
    }

    let job = sqlx::query_as::<_, Job>(
        r#"
        UPDATE jobs
        SET status = 'in_progress',
            selected_professional_id = ?,
            updated_at = datetime('now')
        WHERE id = ? AND status = 'open'
        RETURNING *
        "#,
    )
    .bind(&bid.professional_id)
    .bind(&bid.job_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| {
        Error::Conflict(format!("Job {} is no longer open", bid.job_id))
    })?;

    // Snapshot the losers before flipping them, so callers can notify them.
    let losers = sqlx::query_as::<_, Bid>(
        r#"
        SELECT * FROM bids
        WHERE job_id = ? AND status = 'pending' AND id != ?
        "#,
    )
    .bind(&bid.job_id)
    .bind(bid_id)
    .fetch_all(&mut *tx)
    .await?;

    let accepted = sqlx::query_as::<_, Bid>(
        r#"
        UPDATE bids
        SET status = 'accepted', updated_at = datetime('now')
        WHERE id = ? AND status = 'pending'
        RETURNING *
        "#,
    )
    .bind(bid_id)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        UPDATE bids
        SET status = 'rejected', updated_at = datetime('now')
        WHERE job_id = ? AND status = 'pending'
        "#,
    )
    .bind(&bid.job_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    let rejected = losers
        .into_iter()
        .map(|mut b| {
            b.status = "rejected".to_string();
            b
        })
        .collect();

    Ok(AcceptedBid {
        job,
        bid: accepted,
        rejected,
    })
}

/// Withdraw a pending bid.
pub async fn withdraw_bid(pool: &DbPool, bid_id: &str) -> Result<Bid> {
    let withdrawn = sqlx::query_as::<_, Bid>(
        r#"
        UPDATE bids
        SET status = 'withdrawn', updated_at = datetime('now')
        WHERE id = ? AND status = 'pending'
        RETURNING *
        "#,
    )
    .bind(bid_id)
    .fetch_optional(pool)
    .await?;

    match withdrawn {
        Some(bid) => Ok(bid),
        None => {
            let current = get_bid(pool, bid_id).await?;
            Err(Error::Conflict(format!(
                "Bid {} is {}, cannot withdraw",
                bid_id, current.status
            )))
        }
    }
}
