//! Workbridge - Services Marketplace Backend
//!
//! Two-sided marketplace: customers post jobs and accept bids,
//! professionals apply, get admin-approved via one-time signup tokens,
//! and bid on open jobs.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;
pub mod validation;

pub use config::config;
pub use error::{Error, Result};
pub use state::AppState;
