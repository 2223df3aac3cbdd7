//! Error types for the fallible edges of the crate
//!
//! The simulation itself never fails; these cover configuration loading,
//! rank table validation and best-score storage.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// No storage backend is reachable (e.g. LocalStorage disabled)
    #[error("storage unavailable")]
    StorageUnavailable,

    /// The storage backend rejected a read or write
    #[error("storage error: {0}")]
    Storage(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid tuning: {0}")]
    InvalidTuning(String),

    #[error("invalid rank table: {0}")]
    InvalidRanks(String),
}

pub type Result<T> = std::result::Result<T, Error>;
