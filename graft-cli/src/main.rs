//! graft - import JSON records into an object graph
//!
//! Loads a schema and a records file, imports the records into an in-memory
//! session and prints the resulting graph as JSON.
//!
//! Usage:
//!   graft --schema schema.json --records people.json --kind Person

use anyhow::Result;
use clap::Parser;
use graft_cli::{ImportRequest, run_import};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "graft")]
#[command(about = "Import JSON records into an object graph")]
struct Args {
    /// Path to the JSON schema file
    #[arg(short, long)]
    schema: PathBuf,

    /// Path to the JSON records file (array or single object)
    #[arg(short, long)]
    records: PathBuf,

    /// Entity kind the top-level records belong to
    #[arg(short, long)]
    kind: String,

    /// Default date pattern for date attributes without their own format
    #[arg(long)]
    date_format: Option<String>,

    /// Always create a new instance for a single-record file
    #[arg(long)]
    no_check_existing: bool,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let summary = run_import(&ImportRequest {
        schema: args.schema,
        records: args.records,
        kind: args.kind,
        date_format: args.date_format,
        check_existing: !args.no_check_existing,
    })?;
    println!("{}", serde_json::to_string_pretty(&summary.to_json())?);
    Ok(())
}
