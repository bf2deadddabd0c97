//! Application state for Workbridge.
//!
//! Contains the shared state that is passed to all handlers.

use crate::db::DbPool;
use crate::services::{ApplicationService, AuthService, LedgerService, Mailer};
use crate::{config, Result};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: DbPool,
    /// Outbound email dispatch.
    pub mailer: Mailer,
    /// Application lifecycle service.
    pub applications: ApplicationService,
    /// Job/bid ledger service.
    pub ledger: LedgerService,
    /// Custom auth service.
    pub auth: AuthService,
}

impl AppState {
    /// Create a new application state, initializing all services.
    pub async fn new() -> Result<Self> {
        let config = config::config();

        let db = crate::db::init_pool(&config.database.path).await?;
        crate::db::initialize_schema(&db).await?;

        Ok(Self::from_pool(db, config))
    }

    /// Build state over an existing pool. Used by tests with in-memory
    /// databases.
    pub fn from_pool(db: DbPool, config: &config::Config) -> Self {
        let mailer = Mailer::new(db.clone(), &config.mail);

        let applications = ApplicationService::new(
            db.clone(),
            mailer.clone(),
            config.server.public_url.clone(),
            config.auth.signup_token_ttl_days,
        );

        let ledger = LedgerService::new(db.clone(), mailer.clone());

        let auth = AuthService::new(db.clone(), &config.auth);

        Self {
            db,
            mailer,
            applications,
            ledger,
            auth,
        }
    }
}
