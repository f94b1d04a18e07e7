use crate::error::StorageResult;
use graft_types::{AttributeValue, ObjectId};

/// A mark in a session's pending changes, returned by [`Session::savepoint`].
///
/// Savepoints nest: rolling back to one also discards every change made after
/// savepoints taken later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Savepoint(u64);

impl Savepoint {
    pub const fn new(mark: u64) -> Self {
        Self(mark)
    }

    pub const fn mark(self) -> u64 {
        self.0
    }
}

/// A unit of work against a persistent object graph.
///
/// Changes made through a session are pending until [`Session::save`] is
/// called. Lookups must see pending changes, so an instance created earlier
/// in an import can be found again by a later record.
pub trait Session {
    /// Allocates a new, empty instance of `kind`.
    fn create(&mut self, kind: &str) -> StorageResult<ObjectId>;

    /// Finds an instance of `kind` whose `attribute` equals `value`.
    fn find_by_attribute(
        &self,
        kind: &str,
        attribute: &str,
        value: &AttributeValue,
    ) -> StorageResult<Option<ObjectId>>;

    /// Returns the kind an instance was created as.
    fn kind_of(&self, id: ObjectId) -> StorageResult<String>;

    fn attribute(&self, id: ObjectId, name: &str) -> StorageResult<Option<AttributeValue>>;

    fn set_attribute(&mut self, id: ObjectId, name: &str, value: AttributeValue)
    -> StorageResult<()>;

    /// Returns the instances currently related through `relationship`, in order.
    fn related(&self, id: ObjectId, relationship: &str) -> StorageResult<Vec<ObjectId>>;

    /// Replaces the related set of `relationship`.
    fn set_related(
        &mut self,
        id: ObjectId,
        relationship: &str,
        related: Vec<ObjectId>,
    ) -> StorageResult<()>;

    /// Deletes an instance and unlinks it from every relationship.
    fn delete(&mut self, id: ObjectId) -> StorageResult<()>;

    /// Marks the current state of the pending changes.
    fn savepoint(&mut self) -> Savepoint;

    /// Discards pending changes made since `savepoint`, keeping earlier ones.
    ///
    /// Fails if the savepoint was taken before the last save or rollback.
    fn rollback_to(&mut self, savepoint: Savepoint) -> StorageResult<()>;

    /// Commits pending changes.
    fn save(&mut self) -> StorageResult<()>;

    /// Discards pending changes.
    fn rollback(&mut self);
}
