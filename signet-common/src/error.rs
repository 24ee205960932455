//! Common error types for the signet player core

use thiserror::Error;

/// Common result type for signet operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the signet crates
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error (wraps serde_json::Error)
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Media item construction or playback error
    #[error("Media error: {0}")]
    Media(String),

    /// Region-level scheduling error (region cannot play)
    #[error("Region error: {0}")]
    Region(String),

    /// Invalid state for the requested operation
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),
}
