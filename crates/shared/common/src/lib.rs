//! Common utilities shared across all crates.
//!
//! This crate provides:
//! - Unified error handling and provider fault normalisation
//! - Configuration structures
//! - Cancellation helpers for client calls
//! - Database connection and migrations (feature `database`)

pub mod cancel;
pub mod config;
pub mod error;

#[cfg(feature = "database")]
pub mod db;

pub use cancel::with_cancel;
pub use config::*;
pub use error::{
    AppError, AppResult, ErrorMapper, ErrorObject, OptionExt, ProviderFault, Severity,
    DEFAULT_CODE,
};

#[cfg(feature = "database")]
pub use db::{Database, MigrationStatus, Migrator};
