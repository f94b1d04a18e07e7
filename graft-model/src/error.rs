//! Error types for schema declaration and metadata resolution.

use thiserror::Error;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors that can occur while building a schema or resolving metadata.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The requested kind is not registered in the schema.
    #[error("unknown entity kind: {0}")]
    UnknownEntityKind(String),

    /// Two kinds were declared with the same name.
    #[error("duplicate entity kind: {0}")]
    DuplicateKind(String),

    /// A kind was declared without a name.
    #[error("entity kind name must not be empty")]
    EmptyKindName,

    /// An attribute or relationship name is used twice within one kind.
    #[error("duplicate property {property:?} on {kind}")]
    DuplicateProperty { kind: String, property: String },

    /// More than one attribute of a kind is flagged as primary key.
    #[error("{kind} declares more than one primary key: {first} and {second}")]
    MultiplePrimaryKeys {
        kind: String,
        first: String,
        second: String,
    },

    /// The primary key attribute has a type that cannot identify an instance.
    #[error("{kind}.{attribute} cannot be a primary key: {reason}")]
    InvalidPrimaryKey {
        kind: String,
        attribute: String,
        reason: String,
    },

    /// A relationship points at a kind that is not registered.
    #[error("{kind}.{relationship} targets unknown kind {target}")]
    UnknownTarget {
        kind: String,
        relationship: String,
        target: String,
    },

    /// A date format was attached to a non-date attribute.
    #[error("{kind}.{attribute} has a date format but is not a date attribute")]
    DateFormatOnNonDate { kind: String, attribute: String },

    /// A date format pattern could not be compiled.
    #[error("invalid date format {pattern:?}: {reason}")]
    InvalidDateFormat { pattern: String, reason: String },

    /// Schema document could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
