//! Diff engine (spec §4.5): pure base-vs-modified comparison over a
//! `FlatDataset`, producing an unordered `ChangeSet`. Ordering is the
//! orderer's job (§4.6), not this module's.

use indexmap::IndexMap;
use serde_json::Value;

use crate::dataset::{FlatDataset, FlatRow};
use crate::key::pk_key;
use crate::schema::types::Schema;

#[derive(Debug, Clone)]
pub enum Change {
    Insert { table: String, row: FlatRow },
    Update {
        table: String,
        primary_key: FlatRow,
        old_values: FlatRow,
        new_values: FlatRow,
    },
    Delete { table: String, primary_key: FlatRow, old_row: FlatRow },
}

impl Change {
    pub fn table(&self) -> &str {
        match self {
            Change::Insert { table, .. } => table,
            Change::Update { table, .. } => table,
            Change::Delete { table, .. } => table,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    pub changes: Vec<Change>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Compare `base` against `modified` for every table the schema knows
/// about, keyed by primary key.
pub fn diff(schema: &Schema, base: &FlatDataset, modified: &FlatDataset) -> ChangeSet {
    let mut changes = Vec::new();

    for (table_name, table) in &schema.tables {
        let pk_columns = &table.primary_key;
        let generated_columns = generated_columns(table);
        let base_index = index_by_pk(base.rows(table_name), pk_columns);
        let modified_index = index_by_pk(modified.rows(table_name), pk_columns);

        for (key, modified_row) in &modified_index {
            match base_index.get(key) {
                None => changes.push(Change::Insert {
                    table: table_name.clone(),
                    row: without_generated(modified_row, &generated_columns),
                }),
                Some(base_row) => {
                    let (old_values, new_values) =
                        differing_columns(base_row, modified_row, pk_columns, &generated_columns);
                    if !new_values.is_empty() {
                        changes.push(Change::Update {
                            table: table_name.clone(),
                            primary_key: extract_pk(modified_row, pk_columns),
                            old_values,
                            new_values,
                        });
                    }
                }
            }
        }

        for (key, base_row) in &base_index {
            if !modified_index.contains_key(key) {
                changes.push(Change::Delete {
                    table: table_name.clone(),
                    primary_key: extract_pk(base_row, pk_columns),
                    old_row: (*base_row).clone(),
                });
            }
        }
    }

    ChangeSet { changes }
}

fn index_by_pk<'a>(rows: &'a [FlatRow], pk_columns: &[String]) -> IndexMap<String, &'a FlatRow> {
    rows.iter().map(|row| (pk_key(row, pk_columns), row)).collect()
}

fn extract_pk(row: &FlatRow, pk_columns: &[String]) -> FlatRow {
    pk_columns
        .iter()
        .map(|c| (c.clone(), row.get(c).cloned().unwrap_or(Value::Null)))
        .collect()
}

/// Columns the server always computes (spec §3, `Column.is_generated`) —
/// must never appear in an `INSERT`'s column list or an `UPDATE`'s SET list.
fn generated_columns(table: &crate::schema::types::Table) -> std::collections::HashSet<String> {
    table.columns.values().filter(|c| c.is_generated).map(|c| c.name.clone()).collect()
}

fn without_generated(row: &FlatRow, generated_columns: &std::collections::HashSet<String>) -> FlatRow {
    row.iter().filter(|(k, _)| !generated_columns.contains(*k)).map(|(k, v)| (k.clone(), v.clone())).collect()
}

fn differing_columns(
    base_row: &FlatRow,
    modified_row: &FlatRow,
    pk_columns: &[String],
    generated_columns: &std::collections::HashSet<String>,
) -> (FlatRow, FlatRow) {
    let mut old_values = FlatRow::new();
    let mut new_values = FlatRow::new();

    let mut seen = std::collections::HashSet::new();
    for col in base_row.keys().chain(modified_row.keys()) {
        if !seen.insert(col.clone()) || pk_columns.contains(col) || generated_columns.contains(col) {
            continue;
        }
        let old = base_row.get(col).unwrap_or(&Value::Null);
        let new = modified_row.get(col).unwrap_or(&Value::Null);
        if !values_equal(old, new) {
            old_values.insert(col.clone(), old.clone());
            new_values.insert(col.clone(), new.clone());
        }
    }
    (old_values, new_values)
}

/// Null equals null; ISO-8601 instants compare by the instant they name
/// rather than by string form; everything else by strict/structural
/// equality (`serde_json::Value`'s own `PartialEq` is already
/// order-independent for objects).
fn values_equal(a: &Value, b: &Value) -> bool {
    if a == b {
        return true;
    }
    if let (Value::String(a_str), Value::String(b_str)) = (a, b) {
        if let (Some(a_instant), Some(b_instant)) = (parse_instant(a_str), parse_instant(b_str)) {
            return a_instant == b_instant;
        }
    }
    false
}

fn parse_instant(s: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    chrono::DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&chrono::Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::{Column, DataType, Table};
    use serde_json::json;

    fn user_schema() -> Schema {
        let mut schema = Schema::new();
        let mut user = Table::new("user".to_string());
        user.columns.insert("id".to_string(), Column::new("id".to_string(), DataType::VarChar, "varchar".to_string()));
        user.columns.insert("name".to_string(), Column::new("name".to_string(), DataType::VarChar, "varchar".to_string()));
        user.columns.insert("email".to_string(), Column::new("email".to_string(), DataType::VarChar, "varchar".to_string()));
        user.primary_key = vec!["id".to_string()];
        schema.tables.insert("user".to_string(), user);
        schema
    }

    fn dataset(rows: Vec<FlatRow>) -> FlatDataset {
        let mut d = FlatDataset::new();
        d.tables.insert("user".to_string(), rows);
        d
    }

    fn row(id: &str, name: &str, email: &str) -> FlatRow {
        let mut r = FlatRow::new();
        r.insert("id".to_string(), json!(id));
        r.insert("name".to_string(), json!(name));
        r.insert("email".to_string(), json!(email));
        r
    }

    #[test]
    fn identical_datasets_produce_no_changes() {
        let schema = user_schema();
        let base = dataset(vec![row("u1", "Alice", "alice@example.com")]);
        let modified = dataset(vec![row("u1", "Alice", "alice@example.com")]);
        let changes = diff(&schema, &base, &modified);
        assert!(changes.is_empty());
    }

    #[test]
    fn new_key_in_modified_is_an_insert() {
        let schema = user_schema();
        let base = dataset(vec![row("u1", "Alice", "alice@example.com")]);
        let modified = dataset(vec![row("u1", "Alice", "alice@example.com"), row("u3", "Charlie", "charlie@example.com")]);
        let changes = diff(&schema, &base, &modified);
        assert_eq!(changes.changes.len(), 1);
        match &changes.changes[0] {
            Change::Insert { table, row } => {
                assert_eq!(table, "user");
                assert_eq!(row["id"], json!("u3"));
            }
            other => panic!("expected Insert, got {other:?}"),
        }
    }

    #[test]
    fn missing_key_in_modified_is_a_delete() {
        let schema = user_schema();
        let base = dataset(vec![row("u1", "Alice", "alice@example.com"), row("u2", "Bob", "bob@example.com")]);
        let modified = dataset(vec![row("u1", "Alice", "alice@example.com")]);
        let changes = diff(&schema, &base, &modified);
        assert_eq!(changes.changes.len(), 1);
        match &changes.changes[0] {
            Change::Delete { table, primary_key, .. } => {
                assert_eq!(table, "user");
                assert_eq!(primary_key["id"], json!("u2"));
            }
            other => panic!("expected Delete, got {other:?}"),
        }
    }

    #[test]
    fn changed_column_is_an_update_carrying_only_the_diff() {
        let schema = user_schema();
        let base = dataset(vec![row("u1", "Alice", "alice@example.com")]);
        let modified = dataset(vec![row("u1", "Alice Updated", "new@example.com")]);
        let changes = diff(&schema, &base, &modified);
        assert_eq!(changes.changes.len(), 1);
        match &changes.changes[0] {
            Change::Update { primary_key, old_values, new_values, .. } => {
                assert_eq!(primary_key["id"], json!("u1"));
                assert_eq!(old_values["name"], json!("Alice"));
                assert_eq!(new_values["name"], json!("Alice Updated"));
                assert_eq!(old_values["email"], json!("alice@example.com"));
                assert_eq!(new_values["email"], json!("new@example.com"));
            }
            other => panic!("expected Update, got {other:?}"),
        }
    }

    #[test]
    fn equivalent_iso8601_instants_are_not_reported_as_changed() {
        let schema = user_schema();
        let base = dataset(vec![row("u1", "Alice", "2024-01-01T00:00:00Z")]);
        let modified = dataset(vec![row("u1", "Alice", "2024-01-01T00:00:00+00:00")]);
        let changes = diff(&schema, &base, &modified);
        assert!(changes.is_empty());
    }

    #[test]
    fn three_way_scenario_isolates_user_intent_from_concurrent_db_changes() {
        // Literal spec §8 scenario 6: base vs edited only, never touching
        // what the live database independently gained.
        let schema = user_schema();
        let base = dataset(vec![row("u1", "Alice", "a@example.com")]);
        let edited = dataset(vec![row("u1", "Alice", "a@example.com"), row("u3", "Charlie", "c@example.com")]);
        let changes = diff(&schema, &base, &edited);
        assert_eq!(changes.changes.len(), 1);
        assert!(matches!(&changes.changes[0], Change::Insert { .. }));
    }

    #[test]
    fn pk_columns_are_never_reported_as_changed() {
        let schema = user_schema();
        let base = dataset(vec![row("u1", "Alice", "a@example.com")]);
        let modified = dataset(vec![row("u1", "Alice", "a@example.com")]);
        let changes = diff(&schema, &base, &modified);
        assert!(changes.is_empty());
    }

    fn user_schema_with_generated_column() -> Schema {
        let mut schema = user_schema();
        let mut full_name = Column::new("full_name".to_string(), DataType::VarChar, "varchar".to_string());
        full_name.is_generated = true;
        schema.tables.get_mut("user").unwrap().columns.insert("full_name".to_string(), full_name);
        schema
    }

    #[test]
    fn generated_column_is_excluded_from_insert_row() {
        let schema = user_schema_with_generated_column();
        let base = dataset(vec![]);
        let mut inserted = row("u1", "Alice", "a@example.com");
        inserted.insert("full_name".to_string(), json!("Alice Smith"));
        let modified = dataset(vec![inserted]);
        let changes = diff(&schema, &base, &modified);
        assert_eq!(changes.changes.len(), 1);
        match &changes.changes[0] {
            Change::Insert { row, .. } => assert!(!row.contains_key("full_name")),
            other => panic!("expected Insert, got {other:?}"),
        }
    }

    #[test]
    fn generated_column_change_is_never_reported_as_an_update() {
        let schema = user_schema_with_generated_column();
        let mut base_row = row("u1", "Alice", "a@example.com");
        base_row.insert("full_name".to_string(), json!("Alice Smith"));
        let base = dataset(vec![base_row]);
        let mut modified_row = row("u1", "Alice", "a@example.com");
        modified_row.insert("full_name".to_string(), json!("Something Else"));
        let modified = dataset(vec![modified_row]);
        let changes = diff(&schema, &base, &modified);
        assert!(changes.is_empty());
    }
}
