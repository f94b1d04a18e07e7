//! Persistence layer for graft.
//!
//! The importer never owns entity instances. It talks to a [`Session`], which
//! allocates instances, finds them by attribute value, stores attribute and
//! relationship values, and commits or discards pending changes.
//!
//! # Architecture
//!
//! - [`Session`] is the contract a host persistence framework implements
//! - [`MemorySession`] is a complete in-memory implementation used by tests,
//!   the CLI, and embedders without a store of their own
//! - [`Savepoint`]s let a caller discard one record's writes without
//!   touching the rest of the pending changes
//! - A session is confined to one thread for the duration of an import;
//!   parallel imports use one session per worker

mod error;
mod memory;
mod session;

pub use error::{StorageError, StorageResult};
pub use memory::{MemorySession, StoredObject};
pub use session::{Savepoint, Session};
