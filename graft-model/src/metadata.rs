//! Entity metadata resolution.
//!
//! The resolver turns a declared [`EntityKind`] into the flattened view the
//! importer works from: effective import keys, compiled date formats and the
//! primary key position. Resolutions are cached per kind for the lifetime of
//! the resolver and never invalidated, since the schema itself is immutable.

use crate::date_format::DateFormat;
use crate::error::{SchemaError, SchemaResult};
use crate::schema::{Cardinality, DeleteRule, EntityKind, MergePolicy, Schema};
use graft_types::AttributeType;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// Resolved view of one attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeMetadata {
    pub name: String,
    pub import_key: String,
    pub attribute_type: AttributeType,
    /// `None` means the importer's default format applies.
    pub date_format: Option<Arc<DateFormat>>,
    pub primary_key: bool,
}

/// Resolved view of one relationship.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipMetadata {
    pub name: String,
    pub import_key: String,
    pub target: String,
    pub cardinality: Cardinality,
    pub merge_policy: MergePolicy,
    pub delete_rule: DeleteRule,
}

/// Everything the importer needs to know about one entity kind.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityMetadata {
    pub kind: String,
    pub attributes: Vec<AttributeMetadata>,
    pub relationships: Vec<RelationshipMetadata>,
    primary_key: Option<usize>,
}

impl EntityMetadata {
    fn from_kind(kind: &EntityKind) -> SchemaResult<Self> {
        let attributes = kind
            .attributes
            .iter()
            .map(|a| {
                let date_format = a
                    .date_format
                    .as_deref()
                    .map(DateFormat::new)
                    .transpose()?
                    .map(Arc::new);
                Ok(AttributeMetadata {
                    name: a.name.clone(),
                    import_key: a.import_key().to_string(),
                    attribute_type: a.attribute_type,
                    date_format,
                    primary_key: a.primary_key,
                })
            })
            .collect::<SchemaResult<Vec<_>>>()?;

        let relationships = kind
            .relationships
            .iter()
            .map(|r| RelationshipMetadata {
                name: r.name.clone(),
                import_key: r.import_key().to_string(),
                target: r.target.clone(),
                cardinality: r.cardinality,
                merge_policy: r.merge_policy,
                delete_rule: r.delete_rule,
            })
            .collect();

        let primary_key = attributes.iter().position(|a| a.primary_key);

        Ok(Self {
            kind: kind.name.clone(),
            attributes,
            relationships,
            primary_key,
        })
    }

    /// The primary key attribute, if the kind declares one.
    pub fn primary_key(&self) -> Option<&AttributeMetadata> {
        self.primary_key.map(|i| &self.attributes[i])
    }

    /// Looks up an attribute by its internal name.
    pub fn attribute(&self, name: &str) -> Option<&AttributeMetadata> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Looks up a relationship by its internal name.
    pub fn relationship(&self, name: &str) -> Option<&RelationshipMetadata> {
        self.relationships.iter().find(|r| r.name == name)
    }
}

/// Resolves entity kinds against a schema, caching each result.
///
/// Safe to share between threads: lookups take a read lock, and a miss
/// resolves under the write lock so concurrent first resolutions of the same
/// kind produce a single cached entry.
#[derive(Debug)]
pub struct MetadataResolver {
    schema: Arc<Schema>,
    cache: RwLock<HashMap<String, Arc<EntityMetadata>>>,
}

impl MetadataResolver {
    pub fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Returns the metadata for `kind`, resolving it on first use.
    pub fn resolve(&self, kind: &str) -> SchemaResult<Arc<EntityMetadata>> {
        // Entries are immutable once inserted, so a poisoned lock still
        // guards consistent data.
        {
            let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(metadata) = cache.get(kind) {
                return Ok(Arc::clone(metadata));
            }
        }

        let declared = self
            .schema
            .kind(kind)
            .ok_or_else(|| SchemaError::UnknownEntityKind(kind.to_string()))?;

        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(metadata) = cache.get(kind) {
            return Ok(Arc::clone(metadata));
        }
        let metadata = Arc::new(EntityMetadata::from_kind(declared)?);
        debug!(
            "Resolved metadata for {} ({} attributes, {} relationships)",
            kind,
            metadata.attributes.len(),
            metadata.relationships.len()
        );
        cache.insert(kind.to_string(), Arc::clone(&metadata));
        Ok(metadata)
    }

    /// Kinds resolved so far, sorted by name.
    pub fn cached_kinds(&self) -> Vec<String> {
        let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
        let mut kinds: Vec<String> = cache.keys().cloned().collect();
        kinds.sort();
        kinds
    }
}
