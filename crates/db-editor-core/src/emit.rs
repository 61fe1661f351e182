//! SQL emitter (spec §4.6): renders an ordered `ChangeSet` to parameterized
//! statements. Values never interpolate into SQL text — only identifiers
//! do, and only after quoting.

use serde_json::Value;

use crate::diff::{Change, ChangeSet};

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Quote an identifier, doubling any embedded quote character — the sole
/// escaping mechanism, so identifiers never interpolate user data raw.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub fn emit(changes: &ChangeSet) -> Vec<Statement> {
    changes.changes.iter().map(emit_one).collect()
}

fn emit_one(change: &Change) -> Statement {
    match change {
        Change::Insert { table, row } => emit_insert(table, row),
        Change::Update { table, primary_key, new_values, .. } => emit_update(table, primary_key, new_values),
        Change::Delete { table, primary_key, .. } => emit_delete(table, primary_key),
    }
}

fn emit_insert(table: &str, row: &indexmap::IndexMap<String, Value>) -> Statement {
    let columns: Vec<&String> = row.keys().collect();
    let quoted_cols: Vec<String> = columns.iter().map(|c| quote_identifier(c)).collect();
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("${}", i)).collect();
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_identifier(table),
        quoted_cols.join(", "),
        placeholders.join(", "),
    );
    let params = columns.iter().map(|c| row[*c].clone()).collect();
    Statement { sql, params }
}

fn emit_update(
    table: &str,
    primary_key: &indexmap::IndexMap<String, Value>,
    new_values: &indexmap::IndexMap<String, Value>,
) -> Statement {
    let set_columns: Vec<&String> = new_values.keys().collect();
    let pk_columns: Vec<&String> = primary_key.keys().collect();

    let mut idx = 0;
    let set_clause: Vec<String> = set_columns
        .iter()
        .map(|c| {
            idx += 1;
            format!("{} = ${}", quote_identifier(c), idx)
        })
        .collect();
    let where_clause: Vec<String> = pk_columns
        .iter()
        .map(|c| {
            idx += 1;
            format!("{} = ${}", quote_identifier(c), idx)
        })
        .collect();

    let sql = format!(
        "UPDATE {} SET {} WHERE {}",
        quote_identifier(table),
        set_clause.join(", "),
        where_clause.join(" AND "),
    );

    let mut params: Vec<Value> = set_columns.iter().map(|c| new_values[*c].clone()).collect();
    params.extend(pk_columns.iter().map(|c| primary_key[*c].clone()));
    Statement { sql, params }
}

fn emit_delete(table: &str, primary_key: &indexmap::IndexMap<String, Value>) -> Statement {
    let pk_columns: Vec<&String> = primary_key.keys().collect();
    let mut idx = 0;
    let where_clause: Vec<String> = pk_columns
        .iter()
        .map(|c| {
            idx += 1;
            format!("{} = ${}", quote_identifier(c), idx)
        })
        .collect();
    let sql = format!("DELETE FROM {} WHERE {}", quote_identifier(table), where_clause.join(" AND "));
    let params = pk_columns.iter().map(|c| primary_key[*c].clone()).collect();
    Statement { sql, params }
}
