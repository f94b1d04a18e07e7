//! Record importer - applies records to a session using schema-driven mapping.
//!
//! Each record is resolved to an instance (see [`find_or_create`]), its
//! attributes are coerced and assigned, and each relationship payload is
//! imported recursively against the relationship's target kind and then
//! reconciled with [`merge`]. Recursion follows the payload, which is always a
//! finite tree, so cyclic schemas need no special handling.
//!
//! A top-level record is applied under a session savepoint. If any part of it
//! fails, including a nested instance, every write it made is rolled back.

use crate::coerce::coerce;
use crate::config::ImportConfig;
use crate::error::{CoercionResult, ImportError, ImportResult};
use crate::merge::merge;
use crate::upsert::find_or_create;
use graft_model::{
    AttributeMetadata, Cardinality, DateFormat, DeleteRule, EntityMetadata, MetadataResolver,
    RelationshipMetadata, Schema,
};
use graft_store::{Savepoint, Session};
use graft_types::{AttributeValue, ObjectId, Record};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Imports records into a session.
///
/// An importer is immutable once built and can be shared; the metadata cache
/// it resolves through may also be shared between importers via
/// [`Importer::with_resolver`].
#[derive(Debug)]
pub struct Importer {
    resolver: Arc<MetadataResolver>,
    config: ImportConfig,
    default_format: DateFormat,
}

impl Importer {
    /// Creates an importer with its own metadata cache.
    pub fn new(schema: Arc<Schema>, config: ImportConfig) -> ImportResult<Self> {
        Self::with_resolver(Arc::new(MetadataResolver::new(schema)), config)
    }

    /// Creates an importer that resolves through an existing cache.
    pub fn with_resolver(
        resolver: Arc<MetadataResolver>,
        config: ImportConfig,
    ) -> ImportResult<Self> {
        let default_format = DateFormat::new(&config.default_date_format)
            .map_err(|e| ImportError::Config(e.to_string()))?;
        Ok(Self {
            resolver,
            config,
            default_format,
        })
    }

    pub fn resolver(&self) -> &Arc<MetadataResolver> {
        &self.resolver
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    /// The pattern used for date attributes without their own format.
    pub fn default_date_format(&self) -> &str {
        self.default_format.pattern()
    }

    /// Resolves the metadata for `kind`.
    pub fn metadata(&self, kind: &str) -> ImportResult<Arc<EntityMetadata>> {
        Ok(self.resolver.resolve(kind)?)
    }

    /// Coerces one raw value using this importer's default date format.
    pub fn coerce(
        &self,
        raw: &Value,
        attribute: &AttributeMetadata,
    ) -> CoercionResult<Option<AttributeValue>> {
        coerce(raw, attribute, &self.default_format)
    }

    /// Creates or updates one instance per record, in record order.
    ///
    /// If the kind declares a primary key, every record must carry a non-null
    /// value for it; otherwise nothing is imported and
    /// [`ImportError::MissingPrimaryKey`] is returned. A record whose instance
    /// cannot be allocated, at any depth, is logged and left out of the result
    /// with none of its writes kept. Its siblings are unaffected.
    pub fn import_many<S: Session + ?Sized>(
        &self,
        session: &mut S,
        kind: &str,
        records: &[Record],
    ) -> ImportResult<Vec<ObjectId>> {
        let metadata = self.metadata(kind)?;
        let records: Vec<&Record> = records.iter().collect();
        self.import_batch(session, &metadata, &records)
    }

    /// Creates (or, with `check_existing`, creates or updates) one instance.
    pub fn import_one<S: Session + ?Sized>(
        &self,
        session: &mut S,
        kind: &str,
        record: &Record,
        check_existing: bool,
    ) -> ImportResult<ObjectId> {
        let metadata = self.metadata(kind)?;
        self.import_atomic(session, &metadata, record, check_existing)
    }

    /// Imports a decoded JSON document: an array as a batch, an object as a
    /// single upsert. Any other value imports nothing.
    pub fn import_json<S: Session + ?Sized>(
        &self,
        session: &mut S,
        kind: &str,
        value: &Value,
    ) -> ImportResult<Vec<ObjectId>> {
        let metadata = self.metadata(kind)?;
        match value {
            Value::Array(items) => {
                let mut records = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    match item.as_object() {
                        Some(record) => records.push(record),
                        None => {
                            if let Some(pk) = metadata.primary_key() {
                                return Err(ImportError::MissingPrimaryKey {
                                    kind: metadata.kind.clone(),
                                    index,
                                    key: pk.import_key.clone(),
                                });
                            }
                            warn!("Skipping non-object element {} of {} batch", index, kind);
                        }
                    }
                }
                self.import_batch(session, &metadata, &records)
            }
            Value::Object(record) => Ok(vec![self.import_atomic(session, &metadata, record, true)?]),
            other => {
                warn!("Nothing to import for {} from {}", kind, json_type(other));
                Ok(Vec::new())
            }
        }
    }

    /// Assigns the keys of `record` directly to an existing instance.
    ///
    /// Keys are matched against attribute and relationship names of the
    /// instance's kind, bypassing import names. Coercion and merge rules are
    /// the same as for a regular import.
    pub fn import_values<S: Session + ?Sized>(
        &self,
        session: &mut S,
        id: ObjectId,
        record: &Record,
    ) -> ImportResult<()> {
        let kind = session.kind_of(id)?;
        let metadata = self.metadata(&kind)?;
        let savepoint = session.savepoint();
        self.assign_values(session, id, &metadata, record)
            .map_err(|e| Self::undo_record(session, savepoint, e))
    }

    fn assign_values<S: Session + ?Sized>(
        &self,
        session: &mut S,
        id: ObjectId,
        metadata: &EntityMetadata,
        record: &Record,
    ) -> ImportResult<()> {
        let kind = &metadata.kind;
        for (key, raw) in record {
            if let Some(attribute) = metadata.attribute(key) {
                self.apply_attribute(session, id, attribute, raw)?;
            } else if let Some(relationship) = metadata.relationship(key) {
                self.apply_relationship(session, id, relationship, raw)?;
            } else {
                debug!("Ignoring unknown key {:?} for {}", key, kind);
            }
        }
        Ok(())
    }

    fn import_batch<S: Session + ?Sized>(
        &self,
        session: &mut S,
        metadata: &EntityMetadata,
        records: &[&Record],
    ) -> ImportResult<Vec<ObjectId>> {
        if let Some(pk) = metadata.primary_key() {
            let missing = records
                .iter()
                .position(|r| r.get(&pk.import_key).is_none_or(Value::is_null));
            if let Some(index) = missing {
                warn!(
                    "Rejecting {} batch of {}: record {} has no {:?}",
                    metadata.kind,
                    records.len(),
                    index,
                    pk.import_key
                );
                return Err(ImportError::MissingPrimaryKey {
                    kind: metadata.kind.clone(),
                    index,
                    key: pk.import_key.clone(),
                });
            }
        }

        let mut imported = Vec::with_capacity(records.len());
        for (index, record) in records.iter().enumerate() {
            match self.import_atomic(session, metadata, record, true) {
                Ok(id) => imported.push(id),
                Err(e @ (ImportError::AllocationFailure(_) | ImportError::Storage(_))) => {
                    warn!("Skipping record {} of {} batch: {}", index, metadata.kind, e);
                }
                Err(e) => return Err(e),
            }
        }
        info!(
            "Imported {}/{} {} records",
            imported.len(),
            records.len(),
            metadata.kind
        );
        Ok(imported)
    }

    /// Imports one top-level record, discarding all of its writes on error.
    fn import_atomic<S: Session + ?Sized>(
        &self,
        session: &mut S,
        metadata: &EntityMetadata,
        record: &Record,
        check_existing: bool,
    ) -> ImportResult<ObjectId> {
        let savepoint = session.savepoint();
        self.import_record(session, metadata, record, check_existing)
            .map_err(|e| Self::undo_record(session, savepoint, e))
    }

    fn undo_record<S: Session + ?Sized>(
        session: &mut S,
        savepoint: Savepoint,
        err: ImportError,
    ) -> ImportError {
        match session.rollback_to(savepoint) {
            Ok(()) => err,
            Err(rollback) => {
                warn!("Could not discard partial record after {}: {}", err, rollback);
                ImportError::Storage(rollback)
            }
        }
    }

    fn import_record<S: Session + ?Sized>(
        &self,
        session: &mut S,
        metadata: &EntityMetadata,
        record: &Record,
        check_existing: bool,
    ) -> ImportResult<ObjectId> {
        let id = find_or_create(session, metadata, record, check_existing, &self.default_format)?;

        for attribute in &metadata.attributes {
            if let Some(raw) = record.get(&attribute.import_key) {
                self.apply_attribute(session, id, attribute, raw)?;
            }
        }
        for relationship in &metadata.relationships {
            if let Some(payload) = record.get(&relationship.import_key) {
                self.apply_relationship(session, id, relationship, payload)?;
            }
        }
        Ok(id)
    }

    fn apply_attribute<S: Session + ?Sized>(
        &self,
        session: &mut S,
        id: ObjectId,
        attribute: &AttributeMetadata,
        raw: &Value,
    ) -> ImportResult<()> {
        match self.coerce(raw, attribute) {
            Ok(Some(value)) => {
                // skip writes that would not change the stored value
                if session.attribute(id, &attribute.name)?.as_ref() != Some(&value) {
                    session.set_attribute(id, &attribute.name, value)?;
                }
            }
            Ok(None) => {}
            Err(e) => warn!("Leaving {} unchanged on {}: {}", attribute.name, id, e),
        }
        Ok(())
    }

    fn apply_relationship<S: Session + ?Sized>(
        &self,
        session: &mut S,
        owner: ObjectId,
        relationship: &RelationshipMetadata,
        payload: &Value,
    ) -> ImportResult<()> {
        let target = self.metadata(&relationship.target)?;

        let imported = match (relationship.cardinality, payload) {
            (_, Value::Null) => return Ok(()),
            (Cardinality::ToOne, Value::Object(record)) => {
                vec![self.import_record(session, &target, record, true)?]
            }
            (Cardinality::ToMany, Value::Array(items)) => {
                let mut ids = Vec::with_capacity(items.len());
                for item in items {
                    match item.as_object() {
                        Some(record) => ids.push(self.import_record(session, &target, record, true)?),
                        None => warn!(
                            "Ignoring {} element in {}",
                            json_type(item),
                            relationship.name
                        ),
                    }
                }
                ids
            }
            (_, other) => {
                warn!(
                    "Ignoring {} payload for {:?} relationship {}",
                    json_type(other),
                    relationship.cardinality,
                    relationship.name
                );
                return Ok(());
            }
        };

        let current = session.related(owner, &relationship.name)?;
        let outcome = merge(
            &current,
            &imported,
            relationship.cardinality,
            relationship.merge_policy,
        );
        debug!(
            "Merged {} on {} with {}: {} related, {} removed",
            relationship.name,
            owner,
            relationship.merge_policy,
            outcome.related.len(),
            outcome.removed.len()
        );
        session.set_related(owner, &relationship.name, outcome.related)?;

        if relationship.delete_rule == DeleteRule::Cascade {
            for id in outcome.removed {
                session.delete(id)?;
            }
        }
        Ok(())
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
