//! Error types for prodstats

use thiserror::Error;

/// Convenience Result type using the prodstats Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the prodstats service
#[derive(Error, Debug)]
pub enum Error {
    /// Remote fetch produced no usable CSV
    #[error("Data source unavailable: {0}")]
    DataSourceUnavailable(String),

    /// Persistent storage requested but the filesystem is not writable.
    /// Callers degrade to in-memory storage instead of failing a request.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Engine-level failure during a query, carrying the engine's message
    #[error("Query execution failed: {0}")]
    Query(String),

    /// Caller-supplied parameter out of bounds
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Request arrived before the storage manager was initialized
    #[error("Service not ready")]
    NotReady,

    /// Database connection or statement errors (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Dataset download errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// CSV parsing errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
