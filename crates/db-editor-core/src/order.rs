//! Orderer (spec §4.6): sequences a `ChangeSet` so that applying it
//! statement-by-statement never violates a foreign key, then renders it
//! to parameterized SQL.

use std::collections::HashMap;

use crate::diff::{Change, ChangeSet};
use crate::graph::dag::DependencyGraph;
use crate::graph::topo::topological_sort;
use crate::schema::types::Schema;

/// `Delete`s (child-first), then `Update`s (input order preserved), then
/// `Insert`s (parent-first).
pub fn order(schema: &Schema, changes: ChangeSet) -> ChangeSet {
    let graph = DependencyGraph::from_schema(schema);
    let insertion_order = topological_sort(&graph);
    let rank: HashMap<&str, usize> = insertion_order
        .tables
        .iter()
        .enumerate()
        .map(|(i, t)| (t.as_str(), i))
        .collect();

    let mut deletes = Vec::new();
    let mut updates = Vec::new();
    let mut inserts = Vec::new();
    for change in changes.changes {
        match &change {
            Change::Delete { .. } => deletes.push(change),
            Change::Update { .. } => updates.push(change),
            Change::Insert { .. } => inserts.push(change),
        }
    }

    // Deletes: child-first, i.e. reverse of parent-first insertion order.
    deletes.sort_by_key(|c| std::cmp::Reverse(*rank.get(c.table()).unwrap_or(&0)));
    // Inserts: parent-first, the insertion order itself.
    inserts.sort_by_key(|c| *rank.get(c.table()).unwrap_or(&0));
    // Updates keep their relative input order — no sort.

    let mut ordered = deletes;
    ordered.extend(updates);
    ordered.extend(inserts);
    ChangeSet { changes: ordered }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::FlatRow;
    use crate::schema::types::{Column, DataType, ForeignKeyAction, Relationship, Table};
    use serde_json::json;

    fn chain_schema() -> Schema {
        let mut schema = Schema::new();
        schema.tables.insert("organization".to_string(), Table::new("organization".to_string()));

        let mut project = Table::new("project".to_string());
        project.columns.insert("organization_id".to_string(), Column::new("organization_id".to_string(), DataType::Integer, "integer".to_string()));
        schema.tables.insert("project".to_string(), project);
        schema.relationships.push(Relationship {
            id: "project_org_fkey".to_string(),
            from_table: "project".to_string(),
            from_columns: vec!["organization_id".to_string()],
            to_table: "organization".to_string(),
            to_columns: vec!["id".to_string()],
            on_delete: ForeignKeyAction::Cascade,
            on_update: ForeignKeyAction::NoAction,
        });

        let mut task = Table::new("task".to_string());
        task.columns.insert("project_id".to_string(), Column::new("project_id".to_string(), DataType::Integer, "integer".to_string()));
        schema.tables.insert("task".to_string(), task);
        schema.relationships.push(Relationship {
            id: "task_project_fkey".to_string(),
            from_table: "task".to_string(),
            from_columns: vec!["project_id".to_string()],
            to_table: "project".to_string(),
            to_columns: vec!["id".to_string()],
            on_delete: ForeignKeyAction::Cascade,
            on_update: ForeignKeyAction::NoAction,
        });

        schema
    }

    fn pk(id: &str) -> FlatRow {
        let mut r = FlatRow::new();
        r.insert("id".to_string(), json!(id));
        r
    }

    #[test]
    fn literal_insert_update_delete_ordering_scenario() {
        let schema = chain_schema();
        let changes = ChangeSet {
            changes: vec![
                Change::Insert { table: "task".to_string(), row: pk("t1") },
                Change::Delete { table: "organization".to_string(), primary_key: pk("o1"), old_row: pk("o1") },
                Change::Insert { table: "organization".to_string(), row: pk("o2") },
                Change::Update {
                    table: "project".to_string(),
                    primary_key: pk("p1"),
                    old_values: FlatRow::new(),
                    new_values: FlatRow::new(),
                },
                Change::Delete { table: "task".to_string(), primary_key: pk("t0"), old_row: pk("t0") },
                Change::Delete { table: "project".to_string(), primary_key: pk("p0"), old_row: pk("p0") },
                Change::Insert { table: "project".to_string(), row: pk("p2") },
            ],
        };

        let ordered = order(&schema, changes);
        let kinds: Vec<(&str, &str)> = ordered
            .changes
            .iter()
            .map(|c| {
                let kind = match c {
                    Change::Delete { .. } => "delete",
                    Change::Update { .. } => "update",
                    Change::Insert { .. } => "insert",
                };
                (kind, c.table())
            })
            .collect();

        assert_eq!(
            kinds,
            vec![
                ("delete", "task"),
                ("delete", "project"),
                ("delete", "organization"),
                ("update", "project"),
                ("insert", "organization"),
                ("insert", "project"),
                ("insert", "task"),
            ]
        );
    }
}
