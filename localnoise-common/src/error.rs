//! Common error types for LocalNoise

use thiserror::Error;

/// Common result type for LocalNoise operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the LocalNoise backend
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    ///
    /// During band creation this aborts the request: coordinate placement
    /// must not be silently skipped when the nearby-band lookup fails.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Latitude outside [-90, 90] or longitude outside [-180, 180]
    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}
