//! File loading and one-shot imports for the `graft` binary.

use anyhow::{Context, Result};
use graft_import::{ImportConfig, Importer};
use graft_model::Schema;
use graft_store::{MemorySession, Session};
use graft_types::ObjectId;
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// One invocation of the importer.
#[derive(Debug, Clone)]
pub struct ImportRequest {
    pub schema: PathBuf,
    pub records: PathBuf,
    pub kind: String,
    pub date_format: Option<String>,
    /// Only consulted when the records file holds a single object.
    pub check_existing: bool,
}

/// Result of [`run_import`].
#[derive(Debug)]
pub struct ImportSummary {
    pub imported: Vec<ObjectId>,
    /// Every object in the session after the import, in creation order.
    pub objects: Value,
}

impl ImportSummary {
    pub fn to_json(&self) -> Value {
        json!({
            "imported": self.imported.iter().map(ToString::to_string).collect::<Vec<_>>(),
            "objects": self.objects,
        })
    }
}

/// Reads and validates a JSON schema file.
pub fn load_schema(path: &Path) -> Result<Schema> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read schema file {}", path.display()))?;
    Schema::from_json(&text).with_context(|| format!("Invalid schema in {}", path.display()))
}

/// Reads a JSON records file: an array of records or a single record.
pub fn load_records(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read records file {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid JSON in {}", path.display()))
}

/// Imports the records file into a fresh in-memory session and saves it.
pub fn run_import(request: &ImportRequest) -> Result<ImportSummary> {
    let schema = load_schema(&request.schema)?;
    let records = load_records(&request.records)?;

    let mut config = ImportConfig::default();
    if let Some(pattern) = &request.date_format {
        config = config.with_default_date_format(pattern);
    }
    let importer = Importer::new(Arc::new(schema), config)?;
    let mut session = MemorySession::new();

    let imported = match &records {
        Value::Object(record) => {
            vec![importer.import_one(&mut session, &request.kind, record, request.check_existing)?]
        }
        other => {
            if !request.check_existing {
                warn!("--no-check-existing only applies to single-record files");
            }
            importer.import_json(&mut session, &request.kind, other)?
        }
    };
    session.save().context("Failed to save session")?;
    info!(
        "Imported {} {} record(s), {} object(s) in session",
        imported.len(),
        request.kind,
        session.len()
    );

    Ok(ImportSummary {
        imported,
        objects: session.snapshot(),
    })
}
