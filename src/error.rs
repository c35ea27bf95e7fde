// src/error.rs
// Error types shared by the loader, the storage layer and input parsing.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StudyError {
    /// A rating string outside again/hard/good/easy.
    #[error("Unknown rating: {0}")]
    UnknownRating(String),

    #[error("Unknown study mode: {0}")]
    UnknownMode(String),

    /// The content database did not have the expected shape.
    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),

    /// Persisted progress exists but could not be read back.
    #[error("Corrupt progress data: {0}")]
    CorruptProgress(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, StudyError>;
