use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

use crate::schema::types::{ForeignKeyAction, Relationship, Schema};

/// A directed graph over table names built from the schema's foreign
/// keys. Edges point from child table to parent table (`T1 -> T2` iff
/// `T1` has an FK to `T2`), matching the "parent must exist before
/// child" ordering constraint used by the orderer.
pub struct DependencyGraph {
    pub graph: DiGraph<String, EdgeInfo>,
    pub node_indices: HashMap<String, NodeIndex>,
}

/// Information carried by a dependency edge (one foreign key).
#[derive(Debug, Clone)]
pub struct EdgeInfo {
    pub relationship: Relationship,
}

impl DependencyGraph {
    /// Build a dependency graph from a database schema.
    pub fn from_schema(schema: &Schema) -> Self {
        let mut graph = DiGraph::new();
        let mut node_indices = HashMap::new();

        for table_name in schema.tables.keys() {
            let idx = graph.add_node(table_name.clone());
            node_indices.insert(table_name.clone(), idx);
        }

        for rel in &schema.relationships {
            if let (Some(&from_idx), Some(&to_idx)) = (
                node_indices.get(&rel.from_table),
                node_indices.get(&rel.to_table),
            ) {
                graph.add_edge(
                    from_idx,
                    to_idx,
                    EdgeInfo {
                        relationship: rel.clone(),
                    },
                );
            }
        }

        Self {
            graph,
            node_indices,
        }
    }

    pub fn table_name(&self, idx: NodeIndex) -> &str {
        &self.graph[idx]
    }

    pub fn node_index(&self, table_name: &str) -> Option<NodeIndex> {
        self.node_indices.get(table_name).copied()
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.graph.node_weights().map(|s| s.as_str()).collect()
    }

    pub fn table_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

/// `true` iff `rel` is a *composition*: a non-self FK whose delete
/// action is `CASCADE`. Everything else, including every self-referential
/// FK regardless of action, is a *reference*.
pub fn is_composition(rel: &Relationship) -> bool {
    rel.from_table != rel.to_table && rel.on_delete == ForeignKeyAction::Cascade
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::Table;

    fn make_test_schema() -> Schema {
        let mut schema = Schema::new();
        schema.tables.insert("users".to_string(), Table::new("users".to_string()));
        schema.tables.insert("orders".to_string(), Table::new("orders".to_string()));
        schema.tables.insert("order_items".to_string(), Table::new("order_items".to_string()));

        schema.relationships.push(Relationship {
            id: "orders_user_id_fkey".to_string(),
            from_table: "orders".to_string(),
            from_columns: vec!["user_id".to_string()],
            to_table: "users".to_string(),
            to_columns: vec!["id".to_string()],
            on_delete: ForeignKeyAction::Cascade,
            on_update: ForeignKeyAction::NoAction,
        });
        schema.relationships.push(Relationship {
            id: "items_order_id_fkey".to_string(),
            from_table: "order_items".to_string(),
            from_columns: vec!["order_id".to_string()],
            to_table: "orders".to_string(),
            to_columns: vec!["id".to_string()],
            on_delete: ForeignKeyAction::Cascade,
            on_update: ForeignKeyAction::NoAction,
        });
        schema
    }

    #[test]
    fn builds_graph_with_edges() {
        let schema = make_test_schema();
        let graph = DependencyGraph::from_schema(&schema);
        assert_eq!(graph.table_count(), 3);
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn self_reference_is_not_a_composition() {
        let rel = Relationship {
            id: "fk".to_string(),
            from_table: "category".to_string(),
            from_columns: vec!["parent_id".to_string()],
            to_table: "category".to_string(),
            to_columns: vec!["id".to_string()],
            on_delete: ForeignKeyAction::Cascade,
            on_update: ForeignKeyAction::NoAction,
        };
        assert!(!is_composition(&rel));
    }

    #[test]
    fn cross_table_cascade_is_a_composition() {
        let rel = Relationship {
            id: "fk".to_string(),
            from_table: "project".to_string(),
            from_columns: vec!["org_id".to_string()],
            to_table: "organization".to_string(),
            to_columns: vec!["id".to_string()],
            on_delete: ForeignKeyAction::Cascade,
            on_update: ForeignKeyAction::NoAction,
        };
        assert!(is_composition(&rel));
    }

    #[test]
    fn restrict_is_a_reference() {
        let rel = Relationship {
            id: "fk".to_string(),
            from_table: "project".to_string(),
            from_columns: vec!["org_id".to_string()],
            to_table: "organization".to_string(),
            to_columns: vec!["id".to_string()],
            on_delete: ForeignKeyAction::Restrict,
            on_update: ForeignKeyAction::NoAction,
        };
        assert!(!is_composition(&rel));
    }
}
