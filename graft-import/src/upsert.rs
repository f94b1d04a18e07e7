//! Resolution of a record to a persisted instance.

use crate::coerce::coerce;
use crate::error::{ImportError, ImportResult};
use graft_model::{DateFormat, EntityMetadata};
use graft_store::Session;
use graft_types::{ObjectId, Record};
use tracing::{debug, warn};

/// Finds the instance `record` describes, or allocates a new one.
///
/// With `check_existing` set and a primary key declared on the kind, the
/// record's key value is coerced and looked up in the session. Identity is
/// the coerced key value alone. Any other case allocates a new instance.
pub fn find_or_create<S: Session + ?Sized>(
    session: &mut S,
    metadata: &EntityMetadata,
    record: &Record,
    check_existing: bool,
    default_format: &DateFormat,
) -> ImportResult<ObjectId> {
    if check_existing {
        if let Some(pk) = metadata.primary_key() {
            let raw = record.get(&pk.import_key).unwrap_or(&serde_json::Value::Null);
            match coerce(raw, pk, default_format) {
                Ok(Some(key)) => {
                    let existing = session
                        .find_by_attribute(&metadata.kind, &pk.name, &key)
                        .map_err(ImportError::AllocationFailure)?;
                    if let Some(id) = existing {
                        debug!("Matched existing {} {} by {}", metadata.kind, id, pk.name);
                        return Ok(id);
                    }
                }
                Ok(None) => {}
                Err(e) => warn!("Primary key of {} not usable for lookup: {}", metadata.kind, e),
            }
        }
    }

    let id = session
        .create(&metadata.kind)
        .map_err(ImportError::AllocationFailure)?;
    debug!("Created {} {}", metadata.kind, id);
    Ok(id)
}
