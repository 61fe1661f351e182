//! Parse a user-edited JSON document back into a `NestedDataset`,
//! resolving child keys against the ownership tree at every level.

use indexmap::IndexMap;
use serde_json::Value;

use crate::camel::to_camel_case;
use crate::dataset::{FlatRow, NestedDataset, NestedNode, NestedRow, PartialMarker, RefMarker};
use crate::error::{DbEditorError, Result};
use crate::graph::tree::OwnershipTree;
use crate::schema::types::Schema;

impl NestedDataset {
    /// Parse a JSON document of the shape `nest` produces: one key per
    /// root table (camelCase), each holding an array of nodes.
    pub fn from_json(value: &Value, schema: &Schema, tree: &OwnershipTree) -> Result<Self> {
        let obj = value.as_object().ok_or_else(|| DbEditorError::ParseError {
            path: "<document>".to_string(),
            message: "expected a JSON object at the document root".to_string(),
        })?;

        let mut dataset = NestedDataset::new();
        for root in tree.roots() {
            let key = to_camel_case(root);
            let nodes = match obj.get(&key) {
                Some(Value::Array(arr)) => arr
                    .iter()
                    .map(|v| parse_node(v, root, schema, tree, &mut dataset))
                    .collect::<Result<Vec<_>>>()?,
                Some(_) => {
                    return Err(DbEditorError::ParseError {
                        path: "<document>".to_string(),
                        message: format!("expected an array at key '{}'", key),
                    })
                }
                None => Vec::new(),
            };
            dataset.roots.insert(key, nodes);
        }
        Ok(dataset)
    }
}

fn parse_node(
    value: &Value,
    table: &str,
    schema: &Schema,
    tree: &OwnershipTree,
    dataset: &mut NestedDataset,
) -> Result<NestedNode> {
    let obj = value.as_object().ok_or_else(|| DbEditorError::ParseError {
        path: table.to_string(),
        message: "expected a JSON object for a row".to_string(),
    })?;

    if obj.get("$partial").and_then(|v| v.as_bool()) == Some(true) {
        let skipped = obj.get("skipped").and_then(|v| v.as_u64()).unwrap_or(0);
        dataset.truncated.insert(table.to_string(), skipped);
        return Ok(NestedNode::Partial(PartialMarker { skipped }));
    }
    if obj.get("$ref").and_then(|v| v.as_bool()) == Some(true) {
        let mut primary_key = FlatRow::new();
        for (k, v) in obj {
            if k == "$ref" {
                continue;
            }
            primary_key.insert(k.clone(), v.clone());
        }
        return Ok(NestedNode::Ref(RefMarker { primary_key }));
    }

    let columns: std::collections::HashSet<&str> = schema
        .tables
        .get(table)
        .map(|t| t.columns.keys().map(|s| s.as_str()).collect())
        .unwrap_or_default();

    let child_edges: IndexMap<String, String> = tree
        .children_of(table)
        .map(|e| (to_camel_case(&e.child), e.child.clone()))
        .collect();

    let mut row = NestedRow::default();
    for (k, v) in obj {
        if let Some(child_table) = child_edges.get(k) {
            let arr = v.as_array().ok_or_else(|| DbEditorError::ParseError {
                path: table.to_string(),
                message: format!("expected an array at child key '{}'", k),
            })?;
            let children = arr
                .iter()
                .map(|cv| parse_node(cv, child_table, schema, tree, dataset))
                .collect::<Result<Vec<_>>>()?;
            row.children.insert(child_table.clone(), children);
        } else if columns.contains(k.as_str()) {
            row.columns.insert(k.clone(), v.clone());
        }
    }
    Ok(NestedNode::Row(row))
}
