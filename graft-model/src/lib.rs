//! Schema model for graft.
//!
//! Defines the statically declared schema the importer is driven by:
//! - [`EntityKind`]: a named entity type with its attributes and relationships
//! - [`AttributeSpec`] / [`RelationshipSpec`]: per-property import annotations
//! - [`MergePolicy`]: how a relationship's existing set is reconciled on import
//! - [`Schema`]: the validated registry of kinds, built once at startup
//! - [`MetadataResolver`]: resolves a kind into cached [`EntityMetadata`]
//! - [`DateFormat`]: a compiled Unicode date pattern used for date attributes

mod date_format;
mod error;
mod metadata;
mod schema;

pub use date_format::{DEFAULT_IMPORT_DATE_FORMAT, DateFormat};
pub use error::{SchemaError, SchemaResult};
pub use metadata::{AttributeMetadata, EntityMetadata, MetadataResolver, RelationshipMetadata};
pub use schema::{
    AttributeSpec, Cardinality, DeleteRule, EntityKind, MergePolicy, RelationshipSpec, Schema,
};
