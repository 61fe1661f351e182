//! Nested -> flat conversion (spec §4.4): the inverse of `nest`.

use crate::dataset::{FlatDataset, FlatRow, NestedDataset, NestedNode};
use crate::error::{DbEditorError, Result};
use crate::graph::tree::OwnershipTree;
use crate::schema::types::Schema;

/// Flatten a `NestedDataset` back into one row sequence per schema table.
///
/// FK columns omitted by `nest` (because they were implicit from nesting
/// context) are restored from the parent row's own primary key. A
/// `$partial` marker anywhere in the tree is a hard error: syncing a
/// truncated view would delete every row the document doesn't mention.
pub fn flatten(nested: &NestedDataset, schema: &Schema, tree: &OwnershipTree) -> Result<FlatDataset> {
    let mut flat = FlatDataset::new();
    for table in schema.tables.keys() {
        flat.tables.insert(table.clone(), Vec::new());
    }

    for root in tree.roots() {
        if let Some(nodes) = nested.roots.get(&crate::camel::to_camel_case(root)) {
            for node in nodes {
                materialize(node, root, &[], tree, &mut flat)?;
            }
        }
    }
    Ok(flat)
}

fn materialize(
    node: &NestedNode,
    table: &str,
    inherited_fk: &[(String, serde_json::Value)],
    tree: &OwnershipTree,
    flat: &mut FlatDataset,
) -> Result<()> {
    match node {
        NestedNode::Partial(marker) => Err(DbEditorError::TruncatedInput {
            table: table.to_string(),
            skipped: marker.skipped,
        }),
        NestedNode::Ref(marker) => {
            // A $ref stands for a subtree whose rows already exist. Emit a
            // minimal row (PK + inherited FK) so diff sees it as present
            // and leaves it untouched, rather than recursing into it.
            let mut flat_row: FlatRow = marker.primary_key.clone();
            for (col, val) in inherited_fk {
                flat_row.insert(col.clone(), val.clone());
            }
            flat.tables.entry(table.to_string()).or_default().push(flat_row);
            Ok(())
        }
        NestedNode::Row(row) => {
            let mut flat_row: FlatRow = row.columns.clone();
            for (col, val) in inherited_fk {
                flat_row.insert(col.clone(), val.clone());
            }

            for edge in tree.children_of(table) {
                let child_key = crate::camel::to_camel_case(&edge.child);
                let child_fk: Vec<(String, serde_json::Value)> = edge
                    .relationship
                    .from_columns
                    .iter()
                    .zip(edge.relationship.to_columns.iter())
                    .map(|(from_col, to_col)| {
                        let value = flat_row.get(to_col).cloned().unwrap_or(serde_json::Value::Null);
                        (from_col.clone(), value)
                    })
                    .collect();

                if let Some(children) = row.children.get(&child_key) {
                    for child in children {
                        materialize(child, &edge.child, &child_fk, tree, flat)?;
                    }
                }
            }

            flat.tables.entry(table.to_string()).or_default().push(flat_row);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{NestedRow, RefMarker};
    use serde_json::json;

    fn cascade_schema() -> Schema {
        use crate::schema::types::{Column, DataType, ForeignKeyAction, Relationship, Table};
        let mut schema = Schema::new();
        let mut organization = Table::new("organization".to_string());
        organization.columns.insert("id".to_string(), Column::new("id".to_string(), DataType::VarChar, "varchar".to_string()));
        organization.columns.insert("name".to_string(), Column::new("name".to_string(), DataType::VarChar, "varchar".to_string()));
        organization.primary_key = vec!["id".to_string()];
        schema.tables.insert("organization".to_string(), organization);

        let mut project = Table::new("project".to_string());
        project.columns.insert("id".to_string(), Column::new("id".to_string(), DataType::VarChar, "varchar".to_string()));
        project.columns.insert("name".to_string(), Column::new("name".to_string(), DataType::VarChar, "varchar".to_string()));
        project.columns.insert("organization_id".to_string(), Column::new("organization_id".to_string(), DataType::VarChar, "varchar".to_string()));
        project.primary_key = vec!["id".to_string()];
        schema.tables.insert("project".to_string(), project);

        schema.relationships.push(Relationship {
            id: "fk".to_string(),
            from_table: "project".to_string(),
            from_columns: vec!["organization_id".to_string()],
            to_table: "organization".to_string(),
            to_columns: vec!["id".to_string()],
            on_delete: ForeignKeyAction::Cascade,
            on_update: ForeignKeyAction::NoAction,
        });
        schema
    }

    #[test]
    fn flatten_restores_omitted_fk_column() {
        let schema = cascade_schema();
        let tree = crate::graph::tree::OwnershipTree::build(&schema).unwrap();

        let mut project_row = NestedRow::default();
        project_row.columns.insert("id".to_string(), json!("p1"));
        project_row.columns.insert("name".to_string(), json!("Alpha"));

        let mut org_row = NestedRow::default();
        org_row.columns.insert("id".to_string(), json!("o1"));
        org_row.columns.insert("name".to_string(), json!("Acme"));
        org_row.children.insert("project".to_string(), vec![NestedNode::Row(project_row)]);

        let mut nested = NestedDataset::new();
        nested.roots.insert("organization".to_string(), vec![NestedNode::Row(org_row)]);

        let flat = flatten(&nested, &schema, &tree).unwrap();
        assert_eq!(flat.rows("organization").len(), 1);
        let projects = flat.rows("project");
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0]["organization_id"], json!("o1"));
        assert_eq!(projects[0]["id"], json!("p1"));
    }

    #[test]
    fn flatten_rejects_partial_marker() {
        let schema = cascade_schema();
        let tree = crate::graph::tree::OwnershipTree::build(&schema).unwrap();
        let mut nested = NestedDataset::new();
        nested.roots.insert(
            "organization".to_string(),
            vec![NestedNode::Partial(crate::dataset::PartialMarker { skipped: 3 })],
        );
        let result = flatten(&nested, &schema, &tree);
        assert!(matches!(result, Err(DbEditorError::TruncatedInput { .. })));
    }

    #[test]
    fn flatten_materializes_ref_marker_as_minimal_pk_row() {
        let schema = cascade_schema();
        let tree = crate::graph::tree::OwnershipTree::build(&schema).unwrap();
        let mut pk = FlatRow::new();
        pk.insert("id".to_string(), json!("o1"));
        let mut nested = NestedDataset::new();
        nested.roots.insert("organization".to_string(), vec![NestedNode::Ref(RefMarker { primary_key: pk })]);
        let flat = flatten(&nested, &schema, &tree).unwrap();
        let rows = flat.rows("organization");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], json!("o1"));
        assert_eq!(rows[0].len(), 1);
    }

    #[test]
    fn flatten_ref_marker_does_not_recurse_into_children() {
        let schema = cascade_schema();
        let tree = crate::graph::tree::OwnershipTree::build(&schema).unwrap();
        let mut pk = FlatRow::new();
        pk.insert("id".to_string(), json!("o1"));
        let mut nested = NestedDataset::new();
        nested.roots.insert("organization".to_string(), vec![NestedNode::Ref(RefMarker { primary_key: pk })]);
        let flat = flatten(&nested, &schema, &tree).unwrap();
        assert_eq!(flat.rows("project").len(), 0);
    }
}
