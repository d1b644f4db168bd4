//! # platelog-core
//!
//! Core library for platelog - a nutrition tracking analytics backend.
//!
//! This library provides:
//! - Domain types for users, meals, AI requests, and recipe favorites
//! - Database storage layer with SQLite
//! - Analytics assemblers for the user dashboard and admin views
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Architecture
//!
//! Reads flow through three layers:
//! - **Storage:** Normalized SQLite tables behind the repository
//! - **Aggregates:** Grouped queries producing scalar totals and per-day sums
//! - **Assemblers:** Report builders that fold aggregates into payloads
//!
//! ## Example
//!
//! ```rust,no_run
//! use platelog_core::{Config, Database};
//!
//! // Load configuration
//! let config = Config::load().expect("failed to load config");
//!
//! // Open database
//! let db = Database::open(&Config::database_path()).expect("failed to open database");
//! db.migrate().expect("failed to run migrations");
//! ```

// Re-export commonly used items at the crate root
pub use analytics::{AnalyticsRange, ReferenceData};
pub use config::Config;
pub use db::Database;
pub use error::{Error, Result};
pub use types::*;

// Public modules
pub mod analytics;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod types;
