//! Error types for the depot store.

/// Errors that can occur when working with the depot store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Migration error
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Hash parse error
    #[error("invalid hash: {0}")]
    InvalidHash(#[from] crate::hash::HashError),

    /// Link alias already taken by another entry
    #[error("link '{0}' is already in use")]
    LinkDuplicate(String),

    /// Link string does not resolve to an entry
    #[error("link '{0}' does not resolve")]
    LinkNotFound(String),

    /// No live entry with the given id
    #[error("no entry with id {0}")]
    EntryNotFound(i64),

    /// Entry exists but its content record is missing or empty
    #[error("entry {0} has no stored content")]
    FileNotFound(i64),

    /// Content record or physical bytes missing
    #[error("content not found: {0}")]
    ContentNotFound(String),

    /// Action outside the closed access-action set
    #[error("invalid access action: {0}")]
    InvalidAction(String),
}

/// Result type alias for depot store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
