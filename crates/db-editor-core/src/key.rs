//! Canonical, injection-safe primary-key serialization.
//!
//! The key never round-trips into SQL — it exists purely to let the
//! nester, flattener, and diff engine index rows by primary key.

use serde_json::Value;

const SEPARATOR: char = '\u{1}';

/// Concatenate the canonical JSON serialization of each value, separated
/// by a control character that cannot appear in any JSON text.
pub fn canonical_key(values: &[&Value]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(&SEPARATOR.to_string())
}

/// Extract a row's primary-key values, in PK column order, as a canonical key.
pub fn pk_key(row: &indexmap::IndexMap<String, Value>, pk_columns: &[String]) -> String {
    let values: Vec<&Value> = pk_columns
        .iter()
        .map(|c| row.get(c).unwrap_or(&Value::Null))
        .collect();
    canonical_key(&values)
}
