//! Error types for the import engine.

use graft_model::SchemaError;
use graft_store::StorageError;
use thiserror::Error;

/// Result type for import operations.
pub type ImportResult<T> = Result<T, ImportError>;

/// Result type for single-value coercion.
pub type CoercionResult<T> = Result<T, CoercionError>;

/// Errors that abort an import call or a single record.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The schema has no kind by this name.
    #[error("unknown entity kind: {0}")]
    UnknownEntityKind(String),

    /// A batch record has no value for the kind's primary key. Nothing was imported.
    #[error("record {index} of {kind} batch has no value for primary key {key:?}")]
    MissingPrimaryKey {
        kind: String,
        index: usize,
        key: String,
    },

    /// The session could not allocate or fetch an instance.
    #[error("allocation failed: {0}")]
    AllocationFailure(StorageError),

    /// The session rejected a write.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Importer configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Metadata could not be resolved.
    #[error("schema error: {0}")]
    Schema(SchemaError),
}

impl From<SchemaError> for ImportError {
    fn from(err: SchemaError) -> Self {
        match err {
            SchemaError::UnknownEntityKind(kind) => Self::UnknownEntityKind(kind),
            other => Self::Schema(other),
        }
    }
}

/// A raw value that cannot be stored in its attribute.
///
/// Recovered locally: the attribute is left unmodified and the rest of the
/// record is still applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoercionError {
    #[error("cannot coerce {attribute}: {reason}")]
    CoercionFailure { attribute: String, reason: String },

    #[error("{value:?} for {attribute} does not match date format {format:?}")]
    DateFormatMismatch {
        attribute: String,
        value: String,
        format: String,
    },
}
