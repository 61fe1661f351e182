//! Schema-drift diagnostics.
//!
//! Read-only comparison between two schema snapshots (typically the live
//! database vs. the schema embedded alongside the last base snapshot).
//! Never participates in diff/apply correctness — purely advisory.

use serde::{Deserialize, Serialize};

use crate::schema::types::Schema;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriftReport {
    pub has_drift: bool,
    pub new_tables: Vec<String>,
    pub removed_tables: Vec<String>,
    pub new_columns: Vec<ColumnRef>,
    pub removed_columns: Vec<ColumnRef>,
    pub changed_columns: Vec<ColumnChange>,
}

impl DriftReport {
    pub fn summary(&self) -> String {
        if !self.has_drift {
            return "No schema drift detected.".to_string();
        }

        let mut lines = vec!["Schema drift detected:".to_string()];

        for t in &self.new_tables {
            lines.push(format!("  + table: {}", t));
        }
        for t in &self.removed_tables {
            lines.push(format!("  - table: {}", t));
        }
        for c in &self.new_columns {
            lines.push(format!("  + column: {}.{}", c.table, c.column));
        }
        for c in &self.removed_columns {
            lines.push(format!("  - column: {}.{}", c.table, c.column));
        }
        for c in &self.changed_columns {
            lines.push(format!("  ~ {}.{}: {}", c.table, c.column, c.details));
        }

        lines.join("\n")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnRef {
    pub table: String,
    pub column: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnChange {
    pub table: String,
    pub column: String,
    pub change_type: String,
    pub details: String,
}

/// Compare two schema snapshots column-by-column.
///
/// `old` is typically the schema embedded with the last base snapshot,
/// `current` the live database.
pub fn check_drift(old: &Schema, current: &Schema) -> DriftReport {
    let mut new_tables = Vec::new();
    let mut removed_tables = Vec::new();
    let mut new_columns = Vec::new();
    let mut removed_columns = Vec::new();
    let mut changed_columns = Vec::new();

    for table_name in current.tables.keys() {
        if !old.tables.contains_key(table_name) {
            new_tables.push(table_name.clone());
        }
    }
    for table_name in old.tables.keys() {
        if !current.tables.contains_key(table_name) {
            removed_tables.push(table_name.clone());
        }
    }

    for (table_name, current_table) in &current.tables {
        let old_table = match old.tables.get(table_name) {
            Some(t) => t,
            None => continue,
        };

        for col_name in current_table.columns.keys() {
            if !old_table.columns.contains_key(col_name) {
                new_columns.push(ColumnRef {
                    table: table_name.clone(),
                    column: col_name.clone(),
                });
            }
        }
        for col_name in old_table.columns.keys() {
            if !current_table.columns.contains_key(col_name) {
                removed_columns.push(ColumnRef {
                    table: table_name.clone(),
                    column: col_name.clone(),
                });
            }
        }

        for (col_name, current_col) in &current_table.columns {
            if let Some(old_col) = old_table.columns.get(col_name) {
                if current_col.data_type != old_col.data_type {
                    changed_columns.push(ColumnChange {
                        table: table_name.clone(),
                        column: col_name.clone(),
                        change_type: "type_changed".to_string(),
                        details: format!("{} -> {}", old_col.data_type, current_col.data_type),
                    });
                }
                if current_col.is_nullable != old_col.is_nullable {
                    changed_columns.push(ColumnChange {
                        table: table_name.clone(),
                        column: col_name.clone(),
                        change_type: "nullable_changed".to_string(),
                        details: format!(
                            "nullable: {} -> {}",
                            old_col.is_nullable, current_col.is_nullable
                        ),
                    });
                }
            }
        }
    }

    let has_drift = !new_tables.is_empty()
        || !removed_tables.is_empty()
        || !new_columns.is_empty()
        || !removed_columns.is_empty()
        || !changed_columns.is_empty();

    DriftReport {
        has_drift,
        new_tables,
        removed_tables,
        new_columns,
        removed_columns,
        changed_columns,
    }
}
