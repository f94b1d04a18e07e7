//! Error types for the persistence layer.

use graft_types::ObjectId;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Instance not found in the session.
    #[error("object not found: {0}")]
    NotFound(ObjectId),

    /// The session cannot allocate or fetch instances.
    #[error("session unavailable: {0}")]
    Unavailable(String),

    /// The savepoint no longer refers to pending changes.
    #[error("stale savepoint {0}")]
    StaleSavepoint(u64),
}
