//! Auth account and bearer token queries.
//!
//! Users cover all three roles (customer, professional, admin). Bearer
//! tokens are stored as a lookup prefix plus a SHA-256 hash of the full
//! token; the plaintext is only ever returned once, at issue time.

use crate::models::UserRole;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::DbPool;

// ============================================================================
// Types
// ============================================================================

/// User record from the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub display_name: Option<String>,
    pub created_at: String,
    pub last_login: Option<String>,
}

impl User {
    pub fn role_enum(&self) -> UserRole {
        UserRole::from_str(&self.role)
    }

    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

/// Input for creating a new user.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub display_name: Option<String>,
}

/// Bearer token record.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ApiToken {
    pub id: String,
    pub user_id: String,
    pub token_prefix: String,
    pub token_hash: String,
    pub expires_at: String,
    pub created_at: String,
    pub last_used: Option<String>,
}

impl ApiToken {
    pub fn is_expired(&self) -> bool {
        match DateTime::parse_from_rfc3339(&self.expires_at) {
            Ok(dt) => dt < Utc::now(),
            Err(_) => true, // unparseable expiry counts as expired
        }
    }
}

/// Input for creating a bearer token record.
#[derive(Debug, Clone)]
pub struct CreateApiToken {
    pub id: String,
    pub user_id: String,
    pub token_prefix: String,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

// ============================================================================
// User Queries
// ============================================================================

/// Create a new user.
pub async fn create_user(pool: &DbPool, input: CreateUser) -> Result<User> {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, email, password_hash, role, display_name)
        VALUES (?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(&input.id)
    .bind(&input.email)
    .bind(&input.password_hash)
    .bind(input.role.as_str())
    .bind(&input.display_name)
    .fetch_one(pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            Error::AlreadyExists(format!("Account already exists for {}", input.email))
        }
        _ => Error::Database(e),
    })
}

/// Get a user by ID.
pub async fn get_user(pool: &DbPool, id: &str) -> Result<User> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("User not found: {}", id)))
}

/// Get a user by email.
/// Uses idx_users_email index.
pub async fn get_user_by_email(pool: &DbPool, email: &str) -> Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await
        .map_err(Error::Database)
}

/// Update user's last login timestamp.
pub async fn update_last_login(pool: &DbPool, id: &str) -> Result<()> {
    sqlx::query("UPDATE users SET last_login = datetime('now') WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

// ============================================================================
// Bearer Token Queries
// ============================================================================

/// Create a new bearer token record.
pub async fn create_api_token(pool: &DbPool, input: CreateApiToken) -> Result<ApiToken> {
    sqlx::query_as::<_, ApiToken>(
        r#"
        INSERT INTO api_tokens (id, user_id, token_prefix, token_hash, expires_at)
        VALUES (?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(&input.id)
    .bind(&input.user_id)
    .bind(&input.token_prefix)
    .bind(&input.token_hash)
    .bind(input.expires_at.to_rfc3339())
    .fetch_one(pool)
    .await
    .map_err(Error::Database)
}

/// Get token candidates by prefix (fast index lookup).
/// Uses idx_api_tokens_prefix index.
pub async fn get_api_tokens_by_prefix(pool: &DbPool, prefix: &str) -> Result<Vec<ApiToken>> {
    sqlx::query_as::<_, ApiToken>("SELECT * FROM api_tokens WHERE token_prefix = ?")
        .bind(prefix)
        .fetch_all(pool)
        .await
        .map_err(Error::Database)
}

/// Update token's last_used timestamp.
pub async fn update_api_token_last_used(pool: &DbPool, id: &str) -> Result<()> {
    sqlx::query("UPDATE api_tokens SET last_used = datetime('now') WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Delete expired bearer tokens.
pub async fn cleanup_expired_api_tokens(pool: &DbPool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM api_tokens WHERE expires_at < ?")
        .bind(Utc::now().to_rfc3339())
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_memory_pool, migrate};

    async fn setup_test_db() -> DbPool {
        let pool = init_memory_pool().await.unwrap();
        migrate(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_create_and_get_user() {
        let pool = setup_test_db().await;

        let user = create_user(
            &pool,
            CreateUser {
                id: "user-1".to_string(),
                email: "test@example.com".to_string(),
                password_hash: "hash".to_string(),
                role: UserRole::Customer,
                display_name: Some("Test User".to_string()),
            },
        )
        .await
        .unwrap();

        assert_eq!(user.role, "customer");

        let fetched = get_user(&pool, "user-1").await.unwrap();
        assert_eq!(fetched.email, "test@example.com");
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let pool = setup_test_db().await;

        let input = CreateUser {
            id: "user-1".to_string(),
            email: "dup@example.com".to_string(),
            password_hash: "hash".to_string(),
            role: UserRole::Customer,
            display_name: None,
        };
        create_user(&pool, input.clone()).await.unwrap();

        let err = create_user(
            &pool,
            CreateUser {
                id: "user-2".to_string(),
                ..input
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_token_prefix_lookup_and_expiry() {
        let pool = setup_test_db().await;

        create_user(
            &pool,
            CreateUser {
                id: "user-1".to_string(),
                email: "t@example.com".to_string(),
                password_hash: "hash".to_string(),
                role: UserRole::Customer,
                display_name: None,
            },
        )
        .await
        .unwrap();

        let token = create_api_token(
            &pool,
            CreateApiToken {
                id: "tok-1".to_string(),
                user_id: "user-1".to_string(),
                token_prefix: "abcd1234".to_string(),
                token_hash: "deadbeef".to_string(),
                expires_at: Utc::now() + chrono::Duration::days(7),
            },
        )
        .await
        .unwrap();
        assert!(!token.is_expired());

        let found = get_api_tokens_by_prefix(&pool, "abcd1234").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "tok-1");

        assert!(get_api_tokens_by_prefix(&pool, "zzzz9999")
            .await
            .unwrap()
            .is_empty());
    }
}
