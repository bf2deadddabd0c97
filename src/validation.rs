//! Shared validation for API boundaries.
//!
//! One module checks every inbound payload before any write happens, so the
//! form layer and the API layer cannot drift apart. All failures map to
//! Error::Validation (HTTP 400).

use crate::{Error, Result};

/// Require a non-blank field.
fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Validation(format!("{} is required", field)));
    }
    Ok(())
}

/// Minimal email shape check. Deliverability is the provider's problem.
pub fn validate_email(email: &str) -> Result<()> {
    require("email", email)?;
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || !parts[1].contains('.') {
        return Err(Error::Validation(format!("invalid email address: {}", email)));
    }
    Ok(())
}

/// Validate a professional application submission.
pub fn validate_application(
    full_name: &str,
    email: &str,
    category: &str,
    years_experience: i64,
) -> Result<()> {
    require("full_name", full_name)?;
    validate_email(email)?;
    require("category", category)?;
    if years_experience < 0 {
        return Err(Error::Validation(
            "years_experience must not be negative".to_string(),
        ));
    }
    Ok(())
}

/// Validate a job posting. Rejected before any write reaches the store.
pub fn validate_job(
    title: &str,
    description: &str,
    category: &str,
    location: &str,
    timeframe: &str,
    budget_min: i64,
    budget_max: i64,
) -> Result<()> {
    require("title", title)?;
    require("description", description)?;
    require("category", category)?;
    require("location", location)?;
    require("timeframe", timeframe)?;

    if budget_min <= 0 || budget_max <= 0 {
        return Err(Error::Validation("budgets must be greater than zero".to_string()));
    }
    if budget_min > budget_max {
        return Err(Error::Validation(format!(
            "budget_min ({}) must not exceed budget_max ({})",
            budget_min, budget_max
        )));
    }
    Ok(())
}

/// Validate a bid payload.
pub fn validate_bid(amount: i64) -> Result<()> {
    if amount <= 0 {
        return Err(Error::Validation("bid amount must be greater than zero".to_string()));
    }
    Ok(())
}

/// Validate registration / signup credentials.
pub fn validate_credentials(email: &str, password: &str) -> Result<()> {
    validate_email(email)?;
    if password.len() < 8 {
        return Err(Error::Validation(
            "password must be at least 8 characters".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_shapes() {
        assert!(validate_email("jane@example.com").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("jane").is_err());
        assert!(validate_email("jane@nodot").is_err());
        assert!(validate_email("@example.com").is_err());
    }

    #[test]
    fn test_job_budget_ordering() {
        // budget_min=200 > budget_max=50 must be rejected
        let err = validate_job("Fix sink", "desc", "plumbing", "here", "asap", 200, 50)
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        assert!(validate_job("Fix sink", "desc", "plumbing", "here", "asap", 50, 200).is_ok());
    }

    #[test]
    fn test_job_requires_all_fields() {
        assert!(validate_job("", "desc", "plumbing", "here", "asap", 1, 2).is_err());
        assert!(validate_job("t", "", "plumbing", "here", "asap", 1, 2).is_err());
        assert!(validate_job("t", "d", "", "here", "asap", 1, 2).is_err());
        assert!(validate_job("t", "d", "c", "", "asap", 1, 2).is_err());
        assert!(validate_job("t", "d", "c", "l", "", 1, 2).is_err());
    }

    #[test]
    fn test_zero_budgets_rejected() {
        assert!(validate_job("t", "d", "c", "l", "tf", 0, 50).is_err());
        assert!(validate_job("t", "d", "c", "l", "tf", 10, 0).is_err());
    }

    #[test]
    fn test_bid_amount() {
        assert!(validate_bid(1).is_ok());
        assert!(validate_bid(0).is_err());
        assert!(validate_bid(-5).is_err());
    }

    #[test]
    fn test_credentials() {
        assert!(validate_credentials("a@b.co", "longenough").is_ok());
        assert!(validate_credentials("a@b.co", "short").is_err());
    }
}
