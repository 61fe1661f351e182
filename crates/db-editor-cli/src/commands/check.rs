use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use db_editor_core::check::check_drift;
use db_editor_core::schema::types::Schema;

use crate::args::{CheckArgs, CheckFormat};
use crate::connect;

/// Report structural schema drift between the live database and the
/// schema snapshot recorded by the last `dump`. Diagnostic only: has no
/// bearing on diff/apply correctness.
///
/// Exit codes: 0 — no drift, 1 — drift detected (or error).
pub async fn run(args: &CheckArgs) -> Result<()> {
    let snapshot_path = args.against.clone().unwrap_or_else(|| default_snapshot_path(&args.against_file));
    let snapshot_json = std::fs::read_to_string(&snapshot_path).with_context(|| {
        format!(
            "No schema snapshot found at {}. Run `db-editor dump` first.",
            snapshot_path.display()
        )
    })?;
    let previous: Schema = serde_json::from_str(&snapshot_json).context("Failed to parse schema snapshot")?;

    let resolved = connect::resolve(args.db.as_deref(), args.schema.as_deref())?;
    let pool = connect::connect(&resolved.db_url).await?;
    let current = connect::extract_schema(pool, &resolved.schema_name).await?;

    let report = check_drift(&previous, &current);

    match args.format {
        CheckFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        CheckFormat::Text => {
            println!("{}", report.summary());
        }
    }

    if report.has_drift {
        process::exit(1);
    }
    Ok(())
}

fn default_snapshot_path(against_file: &Path) -> PathBuf {
    let stem = against_file.file_stem().and_then(|s| s.to_str()).unwrap_or("data");
    let dir = against_file.parent().unwrap_or_else(|| Path::new(".")).join(".db-editor");
    dir.join(format!("{}.schema-snapshot.json", stem))
}
