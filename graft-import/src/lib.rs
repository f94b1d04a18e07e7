//! Metadata-driven record import for graft.
//!
//! Converts semi-structured records (decoded JSON) into a typed object graph
//! held by a [`graft_store::Session`]:
//! - [`coerce`] converts raw values to an attribute's native type
//! - [`find_or_create`] resolves a record to an existing instance by primary
//!   key, or allocates a new one
//! - [`merge`] reconciles a relationship's current and imported sets under its
//!   [`MergePolicy`](graft_model::MergePolicy)
//! - [`Importer`] drives the above per record, recursing into nested
//!   relationship payloads
//!
//! Import runs synchronously on the caller's thread. Nothing is committed:
//! the caller saves or rolls back the session afterwards.

mod coerce;
mod config;
mod error;
mod importer;
mod merge;
mod upsert;

pub use coerce::coerce;
pub use config::ImportConfig;
pub use error::{CoercionError, CoercionResult, ImportError, ImportResult};
pub use importer::Importer;
pub use merge::{MergeOutcome, merge};
pub use upsert::find_or_create;
