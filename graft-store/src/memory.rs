//! In-memory session.
//!
//! Keeps a working object set plus the last committed snapshot. `save`
//! promotes the working set, `rollback` restores the snapshot. Every pending
//! change is journaled with its inverse so savepoints can undo part of the
//! working set.

use crate::error::{StorageError, StorageResult};
use crate::session::{Savepoint, Session};
use graft_types::{AttributeValue, ObjectId};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// One instance held by a [`MemorySession`].
#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub id: ObjectId,
    pub kind: String,
    pub attributes: BTreeMap<String, AttributeValue>,
    pub relationships: BTreeMap<String, Vec<ObjectId>>,
}

impl StoredObject {
    fn new(id: ObjectId, kind: &str) -> Self {
        Self {
            id,
            kind: kind.to_string(),
            attributes: BTreeMap::new(),
            relationships: BTreeMap::new(),
        }
    }

    /// Renders the object as JSON: id, kind, attributes, then relationships
    /// as arrays of ids.
    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("id".into(), Value::String(self.id.to_string()));
        obj.insert("kind".into(), Value::String(self.kind.clone()));
        for (name, value) in &self.attributes {
            obj.insert(name.clone(), value.to_json());
        }
        for (name, related) in &self.relationships {
            let ids = related.iter().map(|id| Value::String(id.to_string())).collect();
            obj.insert(name.clone(), Value::Array(ids));
        }
        Value::Object(obj)
    }
}

#[derive(Debug, Clone, Default)]
struct ObjectSet {
    order: Vec<ObjectId>,
    objects: HashMap<ObjectId, StoredObject>,
}

/// Inverse of one pending change.
#[derive(Debug)]
enum Undo {
    Created(ObjectId),
    Attribute {
        id: ObjectId,
        name: String,
        previous: Option<AttributeValue>,
    },
    Related {
        id: ObjectId,
        relationship: String,
        previous: Option<Vec<ObjectId>>,
    },
    Deleted {
        object: StoredObject,
        position: usize,
        unlinked: Vec<(ObjectId, String, Vec<ObjectId>)>,
    },
}

/// A [`Session`] backed by process memory.
#[derive(Debug, Default)]
pub struct MemorySession {
    working: ObjectSet,
    committed: ObjectSet,
    dirty: bool,
    object_limit: Option<usize>,
    journal: Vec<Undo>,
    // savepoint marks below this were taken before the last save or rollback
    journal_base: u64,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a session that refuses to allocate beyond `limit` live objects.
    pub fn with_object_limit(limit: usize) -> Self {
        Self {
            object_limit: Some(limit),
            ..Self::default()
        }
    }

    /// Number of live objects, including pending ones.
    pub fn len(&self) -> usize {
        self.working.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.working.order.is_empty()
    }

    /// Number of live objects of `kind`.
    pub fn count(&self, kind: &str) -> usize {
        self.objects_of(kind).len()
    }

    /// Ids of live objects of `kind`, in creation order.
    pub fn objects_of(&self, kind: &str) -> Vec<ObjectId> {
        self.iter()
            .filter(|o| o.kind == kind)
            .map(|o| o.id)
            .collect()
    }

    pub fn object(&self, id: ObjectId) -> Option<&StoredObject> {
        self.working.objects.get(&id)
    }

    /// Iterates live objects in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &StoredObject> {
        self.working
            .order
            .iter()
            .filter_map(|id| self.working.objects.get(id))
    }

    /// True if there are changes not yet saved.
    pub fn has_changes(&self) -> bool {
        self.dirty
    }

    /// Renders every live object as a JSON array, in creation order.
    pub fn snapshot(&self) -> Value {
        Value::Array(self.iter().map(StoredObject::to_json).collect())
    }

    fn object_mut(&mut self, id: ObjectId) -> StorageResult<&mut StoredObject> {
        self.working
            .objects
            .get_mut(&id)
            .ok_or(StorageError::NotFound(id))
    }

    fn get(&self, id: ObjectId) -> StorageResult<&StoredObject> {
        self.working.objects.get(&id).ok_or(StorageError::NotFound(id))
    }

    fn reset_journal(&mut self) {
        self.journal_base += self.journal.len() as u64 + 1;
        self.journal.clear();
    }

    fn undo(&mut self, change: Undo) {
        let working = &mut self.working;
        match change {
            Undo::Created(id) => {
                working.objects.remove(&id);
                working.order.retain(|o| *o != id);
            }
            Undo::Attribute { id, name, previous } => {
                if let Some(object) = working.objects.get_mut(&id) {
                    match previous {
                        Some(value) => object.attributes.insert(name, value),
                        None => object.attributes.remove(&name),
                    };
                }
            }
            Undo::Related {
                id,
                relationship,
                previous,
            } => {
                if let Some(object) = working.objects.get_mut(&id) {
                    match previous {
                        Some(related) => object.relationships.insert(relationship, related),
                        None => object.relationships.remove(&relationship),
                    };
                }
            }
            Undo::Deleted {
                object,
                position,
                unlinked,
            } => {
                let id = object.id;
                working.order.insert(position.min(working.order.len()), id);
                working.objects.insert(id, object);
                for (owner, relationship, related) in unlinked {
                    if let Some(owner) = working.objects.get_mut(&owner) {
                        owner.relationships.insert(relationship, related);
                    }
                }
            }
        }
    }
}

impl Session for MemorySession {
    fn create(&mut self, kind: &str) -> StorageResult<ObjectId> {
        if let Some(limit) = self.object_limit {
            if self.working.order.len() >= limit {
                return Err(StorageError::Unavailable(format!(
                    "object limit of {limit} reached"
                )));
            }
        }
        let id = ObjectId::new();
        self.working.order.push(id);
        self.working.objects.insert(id, StoredObject::new(id, kind));
        self.journal.push(Undo::Created(id));
        self.dirty = true;
        Ok(id)
    }

    fn find_by_attribute(
        &self,
        kind: &str,
        attribute: &str,
        value: &AttributeValue,
    ) -> StorageResult<Option<ObjectId>> {
        Ok(self
            .iter()
            .find(|o| o.kind == kind && o.attributes.get(attribute) == Some(value))
            .map(|o| o.id))
    }

    fn kind_of(&self, id: ObjectId) -> StorageResult<String> {
        Ok(self.get(id)?.kind.clone())
    }

    fn attribute(&self, id: ObjectId, name: &str) -> StorageResult<Option<AttributeValue>> {
        Ok(self.get(id)?.attributes.get(name).cloned())
    }

    fn set_attribute(
        &mut self,
        id: ObjectId,
        name: &str,
        value: AttributeValue,
    ) -> StorageResult<()> {
        let previous = self.object_mut(id)?.attributes.insert(name.to_string(), value);
        self.journal.push(Undo::Attribute {
            id,
            name: name.to_string(),
            previous,
        });
        self.dirty = true;
        Ok(())
    }

    fn related(&self, id: ObjectId, relationship: &str) -> StorageResult<Vec<ObjectId>> {
        Ok(self
            .get(id)?
            .relationships
            .get(relationship)
            .cloned()
            .unwrap_or_default())
    }

    fn set_related(
        &mut self,
        id: ObjectId,
        relationship: &str,
        related: Vec<ObjectId>,
    ) -> StorageResult<()> {
        if let Some(missing) = related.iter().find(|r| !self.working.objects.contains_key(r)) {
            return Err(StorageError::NotFound(*missing));
        }
        let previous = self
            .object_mut(id)?
            .relationships
            .insert(relationship.to_string(), related);
        self.journal.push(Undo::Related {
            id,
            relationship: relationship.to_string(),
            previous,
        });
        self.dirty = true;
        Ok(())
    }

    fn delete(&mut self, id: ObjectId) -> StorageResult<()> {
        let object = self
            .working
            .objects
            .remove(&id)
            .ok_or(StorageError::NotFound(id))?;
        let position = self
            .working
            .order
            .iter()
            .position(|o| *o == id)
            .unwrap_or(self.working.order.len());
        self.working.order.retain(|o| *o != id);

        let mut unlinked = Vec::new();
        for owner in self.working.objects.values_mut() {
            for (name, related) in &mut owner.relationships {
                if related.contains(&id) {
                    unlinked.push((owner.id, name.clone(), related.clone()));
                    related.retain(|r| *r != id);
                }
            }
        }
        self.journal.push(Undo::Deleted {
            object,
            position,
            unlinked,
        });
        self.dirty = true;
        Ok(())
    }

    fn save(&mut self) -> StorageResult<()> {
        debug!("Saving session ({} objects)", self.working.order.len());
        self.committed = self.working.clone();
        self.dirty = false;
        self.reset_journal();
        Ok(())
    }

    fn rollback(&mut self) {
        debug!(
            "Rolling back session to {} committed objects",
            self.committed.order.len()
        );
        self.working = self.committed.clone();
        self.dirty = false;
        self.reset_journal();
    }

    fn savepoint(&mut self) -> Savepoint {
        Savepoint::new(self.journal_base + self.journal.len() as u64)
    }

    fn rollback_to(&mut self, savepoint: Savepoint) -> StorageResult<()> {
        let keep = savepoint
            .mark()
            .checked_sub(self.journal_base)
            .and_then(|n| usize::try_from(n).ok())
            .filter(|n| *n <= self.journal.len())
            .ok_or(StorageError::StaleSavepoint(savepoint.mark()))?;
        let undone = self.journal.len() - keep;
        while self.journal.len() > keep {
            if let Some(change) = self.journal.pop() {
                self.undo(change);
            }
        }
        debug!("Rolled back {} change(s) to savepoint {}", undone, savepoint.mark());
        Ok(())
    }
}
