//! Error types for platelog-core

use thiserror::Error;

/// Main error type for the platelog-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// User not found
    #[error("user not found: {0}")]
    UserNotFound(String),

    /// Invalid request parameter
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type alias for platelog-core
pub type Result<T> = std::result::Result<T, Error>;
