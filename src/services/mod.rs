//! Business services for Workbridge.
//!
//! Services own the domain workflows and collaborate through AppState.
//! The db layer stays free of policy; policy (roles, ownership, email
//! side effects) lives here.

mod applications;
mod auth;
mod ledger;
mod mailer;
pub mod templates;
pub mod tokens;

pub use applications::{ApplicationService, SignupPrefill, SubmitApplication};
pub use auth::{AuthOutcome, AuthService};
pub use ledger::{JobWithBids, LedgerService, PlaceBid, PostJob};
pub use mailer::Mailer;
