//! Job/bid ledger service.
//!
//! Owns the customer/professional-facing operations over jobs and bids,
//! layering ownership and role checks on top of the transactional store
//! operations in db::jobs / db::bids. Outcome notifications after an
//! accepted bid are fire-and-forget.

use tracing::info;

use crate::db::{self, AcceptedBid, Bid, DbPool, Job};
use crate::models::new_id;
use crate::validation;
use crate::{Error, Result};

use super::mailer::Mailer;
use super::templates;

/// Input for posting a job.
#[derive(Debug, Clone)]
pub struct PostJob {
    pub title: String,
    pub description: String,
    pub category: String,
    pub location: String,
    pub timeframe: String,
    pub budget_min: i64,
    pub budget_max: i64,
}

/// Input for placing a bid.
#[derive(Debug, Clone)]
pub struct PlaceBid {
    pub amount: i64,
    pub message: Option<String>,
    pub estimated_duration: Option<String>,
}

/// A job together with its bids.
#[derive(Debug, Clone, serde::Serialize)]
pub struct JobWithBids {
    #[serde(flatten)]
    pub job: Job,
    pub bids: Vec<Bid>,
}

/// Service owning the job/bid ledger.
#[derive(Clone)]
pub struct LedgerService {
    db: DbPool,
    mailer: Mailer,
}

impl LedgerService {
    pub fn new(db: DbPool, mailer: Mailer) -> Self {
        Self { db, mailer }
    }

    /// Create a job for a customer. Validation runs before any write.
    pub async fn create_job(&self, customer_id: &str, input: PostJob) -> Result<Job> {
        validation::validate_job(
            &input.title,
            &input.description,
            &input.category,
            &input.location,
            &input.timeframe,
            input.budget_min,
            input.budget_max,
        )?;

        let job = db::create_job(
            &self.db,
            db::CreateJob {
                id: new_id(),
                customer_id: customer_id.to_string(),
                title: input.title,
                description: input.description,
                category: input.category,
                location: input.location,
                timeframe: input.timeframe,
                budget_min: input.budget_min,
                budget_max: input.budget_max,
            },
        )
        .await?;

        info!("Job {} posted by {}", job.id, customer_id);
        Ok(job)
    }

    /// List open jobs, newest first, optional category filter, capped at 50.
    pub async fn list_open_jobs(&self, category: Option<&str>) -> Result<Vec<Job>> {
        db::list_open_jobs(&self.db, category).await
    }

    /// Substring search over the open set.
    ///
    /// Fetches the capped open-job list and filters in-process by
    /// case-insensitive match on title/description/location/category.
    pub async fn search_jobs(&self, term: &str, category: Option<&str>) -> Result<Vec<Job>> {
        let jobs = db::list_open_jobs(&self.db, category).await?;
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(jobs);
        }

        Ok(jobs
            .into_iter()
            .filter(|job| {
                job.title.to_lowercase().contains(&needle)
                    || job.description.to_lowercase().contains(&needle)
                    || job.location.to_lowercase().contains(&needle)
                    || job.category.to_lowercase().contains(&needle)
            })
            .collect())
    }

    /// Get one job with its bids.
    pub async fn get_job(&self, job_id: &str) -> Result<JobWithBids> {
        let job = db::get_job(&self.db, job_id).await?;
        let bids = db::list_job_bids(&self.db, job_id).await?;
        Ok(JobWithBids { job, bids })
    }

    /// Place a bid on an open job. Only approved professionals may bid.
    pub async fn place_bid(
        &self,
        professional_id: &str,
        job_id: &str,
        input: PlaceBid,
    ) -> Result<Bid> {
        validation::validate_bid(input.amount)?;

        let profile = db::find_professional(&self.db, professional_id)
            .await?
            .ok_or(Error::Forbidden)?;
        if !profile.is_approved() {
            return Err(Error::Forbidden);
        }

        let bid = db::place_bid(
            &self.db,
            db::CreateBid {
                id: new_id(),
                job_id: job_id.to_string(),
                professional_id: professional_id.to_string(),
                amount: input.amount,
                message: input.message,
                estimated_duration: input.estimated_duration,
            },
        )
        .await?;

        info!("Bid {} placed on job {} by {}", bid.id, job_id, professional_id);
        Ok(bid)
    }

    /// Accept a bid on behalf of the job's customer.
    ///
    /// The cascade (job -> in_progress, target bid -> accepted, other
    /// pending bids -> rejected) commits atomically; a concurrent accept on
    /// the same job loses with Conflict. Outcome emails go out after
    /// commit, best-effort.
    pub async fn accept_bid(&self, customer_id: &str, bid_id: &str) -> Result<AcceptedBid> {
        let bid = db::get_bid(&self.db, bid_id).await?;
        let job = db::get_job(&self.db, &bid.job_id).await?;
        if job.customer_id != customer_id {
            return Err(Error::Forbidden);
        }

        let result = db::accept_bid(&self.db, bid_id).await?;

        info!(
            "Bid {} accepted on job {}, {} competing bids rejected",
            bid_id,
            result.job.id,
            result.rejected.len()
        );

        self.notify_bid_outcomes(&result).await;

        Ok(result)
    }

    /// Withdraw a pending bid. Only the bid's owner may withdraw it.
    pub async fn withdraw_bid(&self, professional_id: &str, bid_id: &str) -> Result<Bid> {
        let bid = db::get_bid(&self.db, bid_id).await?;
        if bid.professional_id != professional_id {
            return Err(Error::Forbidden);
        }

        db::withdraw_bid(&self.db, bid_id).await
    }

    /// Mark an in-progress job completed. Customer-owned transition.
    pub async fn complete_job(&self, customer_id: &str, job_id: &str) -> Result<Job> {
        let job = db::get_job(&self.db, job_id).await?;
        if job.customer_id != customer_id {
            return Err(Error::Forbidden);
        }
        db::complete_job(&self.db, job_id).await
    }

    /// Cancel an unfinished job. Customer-owned transition.
    pub async fn cancel_job(&self, customer_id: &str, job_id: &str) -> Result<Job> {
        let job = db::get_job(&self.db, job_id).await?;
        if job.customer_id != customer_id {
            return Err(Error::Forbidden);
        }
        db::cancel_job(&self.db, job_id).await
    }

    async fn notify_bid_outcomes(&self, result: &AcceptedBid) {
        if let Ok(winner) = db::get_user(&self.db, &result.bid.professional_id).await {
            self.mailer
                .send_best_effort(
                    &winner.email,
                    "bid_accepted",
                    &templates::bid_accepted(&result.job.title, result.bid.amount),
                )
                .await;
        }

        for loser in &result.rejected {
            if let Ok(user) = db::get_user(&self.db, &loser.professional_id).await {
                self.mailer
                    .send_best_effort(
                        &user.email,
                        "bid_rejected",
                        &templates::bid_rejected(&result.job.title),
                    )
                    .await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MailConfig;
    use crate::db::{init_memory_pool, migrate};
    use crate::models::UserRole;

    async fn setup() -> (LedgerService, DbPool) {
        let pool = init_memory_pool().await.unwrap();
        migrate(&pool).await.unwrap();

        let mailer = Mailer::new(
            pool.clone(),
            &MailConfig {
                provider_url: None,
                api_key: None,
                from_address: "noreply@test".to_string(),
                admin_address: "admin@test".to_string(),
            },
        );

        db::create_user(
            &pool,
            db::CreateUser {
                id: "cust-1".to_string(),
                email: "cust@example.com".to_string(),
                password_hash: "hash".to_string(),
                role: UserRole::Customer,
                display_name: None,
            },
        )
        .await
        .unwrap();

        (LedgerService::new(pool.clone(), mailer), pool)
    }

    async fn add_professional(pool: &DbPool, id: &str, approved: bool) {
        db::create_user(
            pool,
            db::CreateUser {
                id: id.to_string(),
                email: format!("{}@example.com", id),
                password_hash: "hash".to_string(),
                role: UserRole::Professional,
                display_name: None,
            },
        )
        .await
        .unwrap();

        let status = if approved { "approved" } else { "pending" };
        sqlx::query(
            r#"
            INSERT INTO professionals
                (user_id, full_name, email, category, status, needs_onboarding)
            VALUES (?, ?, ?, 'plumbing', ?, 0)
            "#,
        )
        .bind(id)
        .bind(id)
        .bind(format!("{}@example.com", id))
        .bind(status)
        .execute(pool)
        .await
        .unwrap();
    }

    fn sink_job() -> PostJob {
        PostJob {
            title: "Fix kitchen sink".to_string(),
            description: "Leaking under the basin".to_string(),
            category: "plumbing".to_string(),
            location: "Springfield".to_string(),
            timeframe: "this week".to_string(),
            budget_min: 50,
            budget_max: 200,
        }
    }

    #[tokio::test]
    async fn test_invalid_budget_never_reaches_store() {
        let (service, pool) = setup().await;

        let mut bad = sink_job();
        bad.budget_min = 200;
        bad.budget_max = 50;

        let err = service.create_job("cust-1", bad).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM jobs")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count.0, 0);
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive_substring() {
        let (service, _pool) = setup().await;

        service.create_job("cust-1", sink_job()).await.unwrap();
        let mut other = sink_job();
        other.title = "Install ceiling fan".to_string();
        other.category = "electrical".to_string();
        service.create_job("cust-1", other).await.unwrap();

        let hits = service.search_jobs("KITCHEN", None).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Fix kitchen sink");

        // Matches location and category fields too
        assert_eq!(service.search_jobs("springfield", None).await.unwrap().len(), 2);
        assert_eq!(service.search_jobs("electr", None).await.unwrap().len(), 1);
        assert!(service.search_jobs("nothing-here", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unapproved_professional_cannot_bid() {
        let (service, pool) = setup().await;
        add_professional(&pool, "pro-pending", false).await;

        let job = service.create_job("cust-1", sink_job()).await.unwrap();
        let err = service
            .place_bid(
                "pro-pending",
                &job.id,
                PlaceBid {
                    amount: 100,
                    message: None,
                    estimated_duration: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Forbidden));
    }

    #[tokio::test]
    async fn test_accept_bid_requires_job_owner() {
        let (service, pool) = setup().await;
        add_professional(&pool, "pro-1", true).await;

        let job = service.create_job("cust-1", sink_job()).await.unwrap();
        let bid = service
            .place_bid(
                "pro-1",
                &job.id,
                PlaceBid {
                    amount: 100,
                    message: None,
                    estimated_duration: None,
                },
            )
            .await
            .unwrap();

        let err = service.accept_bid("someone-else", &bid.id).await.unwrap_err();
        assert!(matches!(err, Error::Forbidden));

        let accepted = service.accept_bid("cust-1", &bid.id).await.unwrap();
        assert_eq!(accepted.job.status, "in_progress");
    }

    #[tokio::test]
    async fn test_accept_records_outcome_notifications() {
        let (service, pool) = setup().await;
        add_professional(&pool, "pro-1", true).await;
        add_professional(&pool, "pro-2", true).await;

        let job = service.create_job("cust-1", sink_job()).await.unwrap();
        let winning = service
            .place_bid(
                "pro-1",
                &job.id,
                PlaceBid {
                    amount: 100,
                    message: None,
                    estimated_duration: None,
                },
            )
            .await
            .unwrap();
        service
            .place_bid(
                "pro-2",
                &job.id,
                PlaceBid {
                    amount: 150,
                    message: None,
                    estimated_duration: None,
                },
            )
            .await
            .unwrap();

        service.accept_bid("cust-1", &winning.id).await.unwrap();

        let to_winner = db::list_notifications(&pool, "pro-1@example.com").await.unwrap();
        assert_eq!(to_winner.len(), 1);
        assert_eq!(to_winner[0].kind, "bid_accepted");

        let to_loser = db::list_notifications(&pool, "pro-2@example.com").await.unwrap();
        assert_eq!(to_loser.len(), 1);
        assert_eq!(to_loser[0].kind, "bid_rejected");
    }
}
