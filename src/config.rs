//! Configuration management for Workbridge.
//!
//! Loads configuration from environment variables. The mail provider is
//! optional; without one, outbound email is logged instead of sent.

use std::env;
use std::sync::OnceLock;

/// Global configuration instance
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Get the global configuration
pub fn config() -> &'static Config {
    CONFIG.get_or_init(Config::from_env)
}

/// Initialize configuration (call once at startup)
pub fn init() -> &'static Config {
    config()
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub mail: MailConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Base URL embedded in signup links sent by email.
    pub public_url: String,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    /// Provider endpoint accepting {to, subject, html}. None = log-only mode.
    pub provider_url: Option<String>,
    pub api_key: Option<String>,
    pub from_address: String,
    /// Where admin alerts (new applications) are delivered.
    pub admin_address: String,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Bearer token validity window in days.
    pub token_ttl_days: i64,
    /// Signup token validity window in days.
    pub signup_token_ttl_days: i64,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            server: ServerConfig {
                host: env_or("HOST", "0.0.0.0"),
                port: env_or("PORT", "8080").parse().expect("Invalid PORT"),
                public_url: env_or("PUBLIC_URL", "http://localhost:8080"),
            },
            database: DatabaseConfig {
                path: env_or("DATABASE_PATH", "./data/workbridge.db"),
            },
            mail: MailConfig {
                provider_url: env::var("MAIL_PROVIDER_URL").ok(),
                api_key: env::var("MAIL_API_KEY").ok(),
                from_address: env_or("MAIL_FROM", "noreply@workbridge.local"),
                admin_address: env_or("ADMIN_EMAIL", "admin@workbridge.local"),
            },
            auth: AuthConfig {
                token_ttl_days: env_or("TOKEN_TTL_DAYS", "7").parse().unwrap_or(7),
                signup_token_ttl_days: env_or("SIGNUP_TOKEN_TTL_DAYS", "7")
                    .parse()
                    .unwrap_or(7),
            },
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
