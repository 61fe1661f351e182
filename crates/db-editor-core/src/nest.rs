//! Flat -> nested conversion (spec §4.3).

use std::collections::HashMap;

use crate::camel::to_camel_case;
use crate::dataset::{FlatDataset, FlatRow, NestedDataset, NestedNode, NestedRow, PartialMarker};
use crate::graph::tree::OwnershipTree;
use crate::key::canonical_key;
use crate::schema::types::Schema;

/// Options controlling how many rows `nest` emits before truncating.
#[derive(Debug, Clone, Copy, Default)]
pub struct NestOptions {
    /// Cap on root-table row counts.
    pub limit: Option<usize>,
    /// Cap on every nested (non-root) sequence.
    pub nested_limit: Option<usize>,
}

/// Per-child-table index: FK-value key -> row indices in flat order.
type ChildIndex<'a> = HashMap<String, HashMap<String, Vec<&'a FlatRow>>>;

pub fn nest(flat: &FlatDataset, _schema: &Schema, tree: &OwnershipTree, opts: NestOptions) -> NestedDataset {
    let mut child_index: ChildIndex = HashMap::new();
    for edge in tree.edges() {
        let rows = flat.rows(&edge.child);
        let mut by_key: HashMap<String, Vec<&FlatRow>> = HashMap::new();
        for row in rows {
            let values: Vec<_> = edge
                .relationship
                .from_columns
                .iter()
                .map(|c| row.get(c).unwrap_or(&serde_json::Value::Null))
                .collect();
            by_key.entry(canonical_key(&values)).or_default().push(row);
        }
        child_index.insert(edge.child.clone(), by_key);
    }

    let mut dataset = NestedDataset::new();
    for root in tree.roots() {
        let rows = flat.rows(root);
        let (emitted, skipped) = apply_limit(rows, opts.limit);
        if skipped > 0 {
            dataset.truncated.insert(root.clone(), skipped as u64);
        }
        let mut nodes: Vec<NestedNode> = emitted
            .iter()
            .map(|row| NestedNode::Row(materialize(row, root, tree, &child_index, opts, &mut dataset)))
            .collect();
        if skipped > 0 {
            nodes.push(NestedNode::Partial(PartialMarker { skipped: skipped as u64 }));
        }
        dataset.roots.insert(to_camel_case(root), nodes);
    }
    dataset
}

fn apply_limit(rows: &[FlatRow], limit: Option<usize>) -> (&[FlatRow], usize) {
    match limit {
        Some(n) if rows.len() > n => (&rows[..n], rows.len() - n),
        _ => (rows, 0),
    }
}

fn materialize(
    row: &FlatRow,
    table: &str,
    tree: &OwnershipTree,
    child_index: &ChildIndex,
    opts: NestOptions,
    dataset: &mut NestedDataset,
) -> NestedRow {
    let omit: Vec<String> = tree
        .parent_edge(table)
        .map(|e| e.relationship.from_columns.clone())
        .unwrap_or_default();

    let mut columns = FlatRow::new();
    for (k, v) in row {
        if !omit.contains(k) {
            columns.insert(k.clone(), v.clone());
        }
    }

    let mut children = indexmap::IndexMap::new();
    for edge in tree.children_of(table) {
        let values: Vec<_> = edge
            .relationship
            .to_columns
            .iter()
            .map(|c| row.get(c).unwrap_or(&serde_json::Value::Null))
            .collect();
        let key = canonical_key(&values);
        let child_rows: &[&FlatRow] = child_index
            .get(&edge.child)
            .and_then(|m| m.get(&key))
            .map(|v| v.as_slice())
            .unwrap_or(&[]);

        let (emitted, skipped) = apply_limit_refs(child_rows, opts.nested_limit);
        if skipped > 0 {
            dataset.truncated.insert(edge.child.clone(), skipped as u64);
        }
        let mut nodes: Vec<NestedNode> = emitted
            .iter()
            .map(|r| NestedNode::Row(materialize(r, &edge.child, tree, child_index, opts, dataset)))
            .collect();
        if skipped > 0 {
            nodes.push(NestedNode::Partial(PartialMarker { skipped: skipped as u64 }));
        }
        children.insert(to_camel_case(&edge.child), nodes);
    }

    NestedRow { columns, children }
}

fn apply_limit_refs<'a>(rows: &'a [&'a FlatRow], limit: Option<usize>) -> (&'a [&'a FlatRow], usize) {
    match limit {
        Some(n) if rows.len() > n => (&rows[..n], rows.len() - n),
        _ => (rows, 0),
    }
}
