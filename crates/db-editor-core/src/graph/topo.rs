//! Topological ordering over the full FK dependency graph, used by the
//! orderer to sequence inserts (parents first) and deletes (children
//! first).
//!
//! Ordinary FK cycles (self-referential or mutual) are tolerated rather
//! than rejected: the affected tables are condensed into one group and
//! placed in an arbitrary but deterministic (alphabetical) position,
//! since statement-time FK checking means any insertion order within a
//! transaction is safe as long as cross-group dependencies are honored.

use petgraph::algo::{condensation, toposort};

use crate::graph::dag::DependencyGraph;

/// Tables in parent-first order (a parent always precedes its children,
/// except within a tolerated FK cycle, where member tables are ordered
/// alphabetically relative to each other).
#[derive(Debug, Clone)]
pub struct InsertionOrder {
    pub tables: Vec<String>,
}

/// Compute the parent-first table order for a dependency graph whose
/// edges point child -> parent.
pub fn topological_sort(graph: &DependencyGraph) -> InsertionOrder {
    let condensed = condensation(graph.graph.clone(), true);

    // condensation output is itself acyclic by construction.
    let sorted_groups =
        toposort(&condensed, None).expect("condensation output must be acyclic");

    // condensation groups child-before-parent (same edge direction as the
    // source graph), so reverse to get parent-first.
    let mut tables = Vec::new();
    for &group_idx in sorted_groups.iter().rev() {
        let mut members: Vec<String> = condensed[group_idx].clone();
        members.sort();
        tables.extend(members);
    }

    InsertionOrder { tables }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::{Column, DataType, ForeignKeyAction, Relationship, Schema, Table};

    #[test]
    fn parent_precedes_child() {
        let mut schema = Schema::new();
        schema.tables.insert("users".to_string(), Table::new("users".to_string()));
        let mut orders = Table::new("orders".to_string());
        orders
            .columns
            .insert("user_id".to_string(), Column::new("user_id".to_string(), DataType::Integer, "integer".to_string()));
        schema.tables.insert("orders".to_string(), orders);
        schema.relationships.push(Relationship {
            id: "fk".to_string(),
            from_table: "orders".to_string(),
            from_columns: vec!["user_id".to_string()],
            to_table: "users".to_string(),
            to_columns: vec!["id".to_string()],
            on_delete: ForeignKeyAction::NoAction,
            on_update: ForeignKeyAction::NoAction,
        });

        let graph = DependencyGraph::from_schema(&schema);
        let order = topological_sort(&graph);

        let users_pos = order.tables.iter().position(|t| t == "users").unwrap();
        let orders_pos = order.tables.iter().position(|t| t == "orders").unwrap();
        assert!(users_pos < orders_pos);
    }

    #[test]
    fn self_reference_does_not_panic_and_is_included() {
        let mut schema = Schema::new();
        schema
            .tables
            .insert("category".to_string(), Table::new("category".to_string()));
        schema.relationships.push(Relationship {
            id: "fk".to_string(),
            from_table: "category".to_string(),
            from_columns: vec!["parent_id".to_string()],
            to_table: "category".to_string(),
            to_columns: vec!["id".to_string()],
            on_delete: ForeignKeyAction::NoAction,
            on_update: ForeignKeyAction::NoAction,
        });

        let graph = DependencyGraph::from_schema(&schema);
        let order = topological_sort(&graph);
        assert_eq!(order.tables, vec!["category".to_string()]);
    }

    #[test]
    fn mutual_cycle_is_tolerated_with_deterministic_order() {
        let mut schema = Schema::new();
        schema.tables.insert("table_a".to_string(), Table::new("table_a".to_string()));
        schema.tables.insert("table_b".to_string(), Table::new("table_b".to_string()));
        schema.relationships.push(Relationship {
            id: "fk_ab".to_string(),
            from_table: "table_a".to_string(),
            from_columns: vec!["b_id".to_string()],
            to_table: "table_b".to_string(),
            to_columns: vec!["id".to_string()],
            on_delete: ForeignKeyAction::NoAction,
            on_update: ForeignKeyAction::NoAction,
        });
        schema.relationships.push(Relationship {
            id: "fk_ba".to_string(),
            from_table: "table_b".to_string(),
            from_columns: vec!["a_id".to_string()],
            to_table: "table_a".to_string(),
            to_columns: vec!["id".to_string()],
            on_delete: ForeignKeyAction::NoAction,
            on_update: ForeignKeyAction::NoAction,
        });

        let graph = DependencyGraph::from_schema(&schema);
        let order = topological_sort(&graph);
        assert_eq!(order.tables, vec!["table_a".to_string(), "table_b".to_string()]);
    }
}
