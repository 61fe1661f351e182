//! Sync orchestrator (spec §4.7): `dump`, `preview`, `sync`, and `reset` —
//! the plain async functions a CLI command wires directly to.
//!
//! `dump` writes the user-facing document (flat or nested) plus a flat
//! base snapshot under a sibling `.db-editor/` directory. `preview`/`sync`
//! are three-way: they diff the base snapshot against the edited file, so
//! concurrent database writes the user never touched survive. `reset` is
//! two-way: it diffs the live database directly against the edited file,
//! so any concurrent write must also be staged in the edited file or it
//! is discarded.

use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::camel::to_camel_case;
use crate::dataset::{FlatDataset, NestedDataset};
use crate::diff::{diff, ChangeSet};
use crate::driver::{Executor, RowFetcher};
use crate::emit::{emit, Statement};
use crate::error::{DbEditorError, Result};
use crate::flatten::flatten;
use crate::graph::tree::OwnershipTree;
use crate::nest::{nest, NestOptions};
use crate::order::order;
use crate::schema::types::Schema;

const BASE_DIR: &str = ".db-editor";

fn base_snapshot_path(output_path: &Path) -> PathBuf {
    let stem = output_path.file_stem().and_then(|s| s.to_str()).unwrap_or("data");
    let dir = output_path.parent().unwrap_or(Path::new(".")).join(BASE_DIR);
    dir.join(format!("{}.base.json", stem))
}

fn schema_companion_path(output_path: &Path, name: &str) -> PathBuf {
    output_path.parent().unwrap_or(Path::new(".")).join(name)
}

/// Write JSON to `path` atomically: write to a sibling temp file, flush
/// and sync it to disk, then rename into place. A crash mid-write leaves
/// whatever was previously at `path` intact.
fn atomic_write_json(path: &Path, value: &Value) -> Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    fs::create_dir_all(dir).map_err(|e| DbEditorError::Io { path: dir.display().to_string(), source: e })?;

    let file_name = path.file_name().and_then(|s| s.to_str()).unwrap_or("data.json");
    let tmp_path = dir.join(format!(".{}.tmp", file_name));

    let json = serde_json::to_string_pretty(value).map_err(|e| DbEditorError::ParseError {
        path: path.display().to_string(),
        message: format!("failed to serialize: {}", e),
    })?;

    let mut file = fs::File::create(&tmp_path).map_err(|e| DbEditorError::Io { path: tmp_path.display().to_string(), source: e })?;
    file.write_all(json.as_bytes()).map_err(|e| DbEditorError::Io { path: tmp_path.display().to_string(), source: e })?;
    file.sync_all().map_err(|e| DbEditorError::Io { path: tmp_path.display().to_string(), source: e })?;

    fs::rename(&tmp_path, path).map_err(|e| DbEditorError::Io { path: path.display().to_string(), source: e })?;
    Ok(())
}

fn read_json(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path).map_err(|e| DbEditorError::Io { path: path.display().to_string(), source: e })?;
    serde_json::from_str(&content).map_err(|e| DbEditorError::ParseError {
        path: path.display().to_string(),
        message: format!("invalid JSON: {}", e),
    })
}

/// Add the `$schema`/`$base` metadata keys (spec §6) to a user-facing
/// document, pointing at the companion files by path relative to it.
fn with_metadata(mut document: Value, schema_companion: Option<&str>, base_relative: Option<&str>) -> Value {
    let obj = document.as_object_mut().expect("document root is always an object");
    if let Some(name) = schema_companion {
        obj.insert("$schema".to_string(), Value::String(name.to_string()));
    }
    if let Some(base) = base_relative {
        obj.insert("$base".to_string(), Value::String(base.to_string()));
    }
    document
}

fn base_relative_path(output_path: &Path) -> String {
    let stem = output_path.file_stem().and_then(|s| s.to_str()).unwrap_or("data");
    format!("{}/{}.base.json", BASE_DIR, stem)
}

/// Fail the moment any table in `nested` carries a `$partial` marker —
/// no destructive operation ever runs against a truncated view.
fn reject_truncated(nested: &NestedDataset) -> Result<()> {
    if let Some((table, skipped)) = nested.truncated.iter().next() {
        return Err(DbEditorError::TruncatedInput { table: table.clone(), skipped: *skipped });
    }
    Ok(())
}

/// Does this parsed document use flat layout (one key per native table
/// name) rather than nested layout (one key per camelCase root table)?
/// A document is flat iff any non-metadata top-level key matches a
/// non-root table's native name exactly — that key could never appear at
/// the top level of a nested document. Ambiguous documents (e.g. a
/// single-table schema where the two layouts coincide) default to nested.
fn is_flat_layout(document: &Value, schema: &Schema, tree: &OwnershipTree) -> bool {
    let obj = match document.as_object() {
        Some(o) => o,
        None => return false,
    };
    let root_keys: HashSet<String> = tree.roots().iter().map(|r| to_camel_case(r)).collect();
    for key in obj.keys() {
        if key.starts_with('$') {
            continue;
        }
        if schema.tables.contains_key(key) && !root_keys.contains(key) {
            return true;
        }
    }
    false
}

fn flatten_document(document: &Value, schema: &Schema, tree: &OwnershipTree) -> Result<FlatDataset> {
    if is_flat_layout(document, schema, tree) {
        FlatDataset::from_json(document)
    } else {
        let nested = NestedDataset::from_json(document, schema, tree)?;
        reject_truncated(&nested)?;
        flatten(&nested, schema, tree)
    }
}

/// Fetch the live database, write it as a user-facing document to
/// `output_path` (nested unless `flat` is set), and — unless
/// `suppress_base` — record a flat base snapshot (always complete, never
/// truncated) under `.db-editor/` so future `preview`/`sync` calls can
/// diff against it. `schema_companion`, if given, is pre-rendered
/// JSON-schema document text (generating it is the CLI's job, per spec
/// §1) written verbatim to a sibling `<stem>.schema.json`, named in the
/// document's `$schema` key.
#[allow(clippy::too_many_arguments)]
pub async fn dump(
    fetcher: &impl RowFetcher,
    schema: &Schema,
    tree: &OwnershipTree,
    output_path: &Path,
    limit: Option<usize>,
    nested_limit: Option<usize>,
    flat: bool,
    suppress_base: bool,
    schema_companion: Option<&str>,
) -> Result<()> {
    let (flat_data, _truncated) = fetcher.fetch_all(schema, limit).await?;

    let document = if flat {
        flat_data.to_json()
    } else {
        let opts = NestOptions { limit, nested_limit };
        let nested = nest(&flat_data, schema, tree, opts);
        nested_to_json(&nested)
    };

    let stem = output_path.file_stem().and_then(|s| s.to_str()).unwrap_or("data").to_string();
    let companion_name = schema_companion.map(|_| format!("{}.schema.json", stem));

    let base_relative = if suppress_base { None } else { Some(base_relative_path(output_path)) };
    let document = with_metadata(document, companion_name.as_deref(), base_relative.as_deref());
    atomic_write_json(output_path, &document)?;

    if !suppress_base {
        // The base snapshot is always complete, even if the user-facing
        // file was dumped with a `limit` — re-fetch without one.
        let full = if limit.is_some() { fetcher.fetch_all(schema, None).await?.0 } else { flat_data };
        atomic_write_json(&base_snapshot_path(output_path), &full.to_json())?;
    }

    if let (Some(content), Some(name)) = (schema_companion, companion_name.as_deref()) {
        let value: Value = serde_json::from_str(content).map_err(|e| DbEditorError::ParseError {
            path: name.to_string(),
            message: format!("schema companion is not valid JSON: {}", e),
        })?;
        atomic_write_json(&schema_companion_path(output_path, name), &value)?;
    }

    Ok(())
}

fn nested_to_json(nested: &NestedDataset) -> Value {
    let mut obj = serde_json::Map::new();
    for (key, nodes) in &nested.roots {
        obj.insert(key.clone(), Value::Array(nodes.iter().map(|n| n.to_json()).collect()));
    }
    Value::Object(obj)
}

/// Parse `input_path`, flatten it, and diff against the base snapshot if
/// one exists next to it, falling back to a live three-way diff against
/// the database otherwise. Returns the ordered statements without
/// applying them.
pub async fn preview(
    fetcher: &impl RowFetcher,
    schema: &Schema,
    tree: &OwnershipTree,
    input_path: &Path,
) -> Result<Vec<Statement>> {
    let (_edited_flat, changes) = three_way_diff(fetcher, schema, tree, input_path).await?;
    Ok(emit(&order(schema, changes)))
}

async fn three_way_diff(
    fetcher: &impl RowFetcher,
    schema: &Schema,
    tree: &OwnershipTree,
    input_path: &Path,
) -> Result<(FlatDataset, ChangeSet)> {
    let document = read_json(input_path)?;
    let declares_base = document.get("$base").is_some();
    let edited = flatten_document(&document, schema, tree)?;

    let base_path = base_snapshot_path(input_path);
    let base = if base_path.exists() {
        FlatDataset::from_json(&read_json(&base_path)?)?
    } else if declares_base {
        return Err(DbEditorError::MissingBase { path: base_path.display().to_string() });
    } else {
        fetcher.fetch_all(schema, None).await?.0
    };

    let changes = diff(schema, &base, &edited);
    Ok((edited, changes))
}

/// Three-way sync: diff the base snapshot against the edited file, apply
/// the result transactionally, then rewrite the base snapshot to match
/// the database's new state.
pub async fn sync(
    fetcher: &impl RowFetcher,
    executor: &impl Executor,
    schema: &Schema,
    tree: &OwnershipTree,
    input_path: &Path,
) -> Result<Vec<Statement>> {
    let (_edited, changes) = three_way_diff(fetcher, schema, tree, input_path).await?;
    if changes.is_empty() {
        return Ok(Vec::new());
    }
    let statements = emit(&order(schema, changes));
    executor.apply(schema, &statements).await?;

    let (refreshed, _truncated) = fetcher.fetch_all(schema, None).await?;
    atomic_write_json(&base_snapshot_path(input_path), &refreshed.to_json())?;

    Ok(statements)
}

/// Two-way sync: diff the live database directly against the edited
/// file (no base snapshot consulted) and apply destructively. Any
/// concurrent database write not reflected in the edited file is lost.
pub async fn reset(
    fetcher: &impl RowFetcher,
    executor: &impl Executor,
    schema: &Schema,
    tree: &OwnershipTree,
    input_path: &Path,
) -> Result<Vec<Statement>> {
    let document = read_json(input_path)?;
    let edited = flatten_document(&document, schema, tree)?;

    let (base, _truncated) = fetcher.fetch_all(schema, None).await?;
    let changes = diff(schema, &base, &edited);
    if changes.is_empty() {
        return Ok(Vec::new());
    }
    let statements = emit(&order(schema, changes));
    executor.apply(schema, &statements).await?;

    let (refreshed, _) = fetcher.fetch_all(schema, None).await?;
    atomic_write_json(&base_snapshot_path(input_path), &refreshed.to_json())?;

    Ok(statements)
}
