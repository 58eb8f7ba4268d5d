//! Error types shared by the store, the session and the config loader.

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong below the view layer
#[derive(Debug, Error)]
pub enum Error {
    /// SQLite refused or failed a statement
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Creating the data directory or reading the config file failed
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The item breaks the validity invariant and was not written
    #[error("invalid item: {0}")]
    InvalidItem(#[from] ValidationError),

    /// Neither a data directory nor a home directory could be found
    #[error("could not determine a data directory for the database")]
    NoDataDir,

    /// The JSON config file could not be parsed
    #[error("invalid config: {0}")]
    Config(#[from] serde_json::Error),

    /// A blocking store call panicked or was cancelled
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Why a shopping item may not be persisted
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ValidationError {
    #[error("name must not be blank")]
    BlankName,

    #[error("quantity must be greater than zero (got {0})")]
    NonPositiveQuantity(i32),

    #[error("price must not be negative (got {0})")]
    NegativePrice(f64),
}
