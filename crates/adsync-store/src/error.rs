use thiserror::Error;
use uuid::Uuid;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite error.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Generic I/O error (e.g. reading a directory seed file).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No record with this id.
    #[error("Ad record not found: {0}")]
    NotFound(Uuid),

    /// The source id is, or once was, in use by another record.
    #[error("Duplicate source id: {0}")]
    DuplicateSourceId(String),

    /// Migration failure.
    #[error("Migration error: {0}")]
    Migration(String),

    /// A stored row could not be decoded back into a record.
    #[error("Corrupt row: {0}")]
    Corrupt(String),

    /// Malformed directory seed file.
    #[error("Seed parse error: {0}")]
    Seed(#[from] serde_json::Error),

    /// A thread panicked while holding the store lock.
    #[error("Store lock poisoned")]
    LockPoisoned,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
