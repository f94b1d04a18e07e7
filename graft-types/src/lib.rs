//! Core type definitions for graft.
//!
//! This crate defines the small, schema-agnostic types every other graft
//! crate depends on:
//! - [`ObjectId`]: identity of a persisted entity instance (UUID v7)
//! - [`AttributeType`]: the native type an attribute is stored as
//! - [`AttributeValue`]: a value already coerced to its native type
//! - [`Record`]: one semi-structured input record (ordered JSON object)

mod ids;
mod value;

pub use ids::ObjectId;
pub use value::{AttributeType, AttributeValue};

/// A single input record: an ordered mapping from string keys to JSON values.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),
}
