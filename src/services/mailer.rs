//! Mail dispatch service.
//!
//! Posts {to, subject, html} to the configured provider endpoint. One send
//! per lifecycle event, no retry, no queue; a provider failure surfaces as
//! Error::Mail to the caller. Every attempt is recorded in the
//! notifications table. Without a configured provider the service runs in
//! log-only mode (local development).

use std::time::Duration;

use reqwest::{header, Client};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::MailConfig;
use crate::db::{self, DbPool};
use crate::error::{Error, Result};
use crate::models::new_id;

use super::templates::Email;

/// Outbound message payload expected by the provider.
#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    to: &'a str,
    from: &'a str,
    subject: &'a str,
    html: &'a str,
}

/// Service for outbound email.
#[derive(Clone)]
pub struct Mailer {
    client: Client,
    db: DbPool,
    provider_url: Option<String>,
    api_key: Option<String>,
    from_address: String,
    admin_address: String,
}

impl Mailer {
    /// Create a new mailer from configuration.
    pub fn new(db: DbPool, config: &MailConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Workbridge/1.0")
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            db,
            provider_url: config.provider_url.clone(),
            api_key: config.api_key.clone(),
            from_address: config.from_address.clone(),
            admin_address: config.admin_address.clone(),
        }
    }

    /// Address admin alerts are delivered to.
    pub fn admin_address(&self) -> &str {
        &self.admin_address
    }

    /// Send one email and record the attempt.
    ///
    /// `kind` labels the lifecycle event in the audit table
    /// (e.g. "approval", "admin_alert", "bid_rejected").
    pub async fn send(&self, to: &str, kind: &str, email: &Email) -> Result<()> {
        let outcome = self.dispatch(to, email).await;

        let (status, error) = match &outcome {
            Ok(()) => ("sent", None),
            Err(e) => ("failed", Some(e.to_string())),
        };

        // Audit failures must not mask the dispatch outcome.
        if let Err(e) = db::create_notification(
            &self.db,
            db::CreateNotification {
                id: new_id(),
                recipient: to.to_string(),
                subject: email.subject.clone(),
                kind: kind.to_string(),
                status: status.to_string(),
                error,
            },
        )
        .await
        {
            warn!("Failed to record notification: {}", e);
        }

        outcome
    }

    /// Fire-and-forget variant: failures are logged, never propagated.
    /// Used where a lifecycle transition must not fail because mail did.
    pub async fn send_best_effort(&self, to: &str, kind: &str, email: &Email) {
        if let Err(e) = self.send(to, kind, email).await {
            warn!("Dropping {} notification to {}: {}", kind, to, e);
        }
    }

    async fn dispatch(&self, to: &str, email: &Email) -> Result<()> {
        let Some(provider_url) = &self.provider_url else {
            info!("Mail provider not configured, logging only: to={} subject={:?}", to, email.subject);
            return Ok(());
        };

        let mut request = self.client.post(provider_url).json(&SendRequest {
            to,
            from: &self.from_address,
            subject: &email.subject,
            html: &email.html,
        });

        if let Some(key) = &self.api_key {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", key));
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Mail(format!(
                "Provider returned {}: {}",
                status, body
            )));
        }

        info!("Sent email to {}: {:?}", to, email.subject);
        Ok(())
    }
}
