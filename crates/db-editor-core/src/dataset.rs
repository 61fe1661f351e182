//! Flat and nested dataset types (spec §3 DATA MODEL).

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::{DbEditorError, Result};

/// A single row: column name -> scalar value. The scalar domain is
/// whatever `serde_json::Value` can hold — null, bool, number, string
/// (covers uuid/date/timestamp as ISO-8601, bytes as base64), plus
/// structured JSON for `json`/`jsonb` columns.
pub type FlatRow = IndexMap<String, Value>;

/// Per-table ordered row sequences. Insertion order is extraction order
/// (typically primary-key order when fetched from the database).
#[derive(Debug, Clone, Default)]
pub struct FlatDataset {
    pub tables: IndexMap<String, Vec<FlatRow>>,
}

impl FlatDataset {
    pub fn new() -> Self {
        Self {
            tables: IndexMap::new(),
        }
    }

    pub fn rows(&self, table: &str) -> &[FlatRow] {
        self.tables.get(table).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Render as the flat-layout JSON document (spec §6): one key per
    /// table, value an ordered array of row objects.
    pub fn to_json(&self) -> Value {
        let mut obj = serde_json::Map::new();
        for (table, rows) in &self.tables {
            obj.insert(
                table.clone(),
                Value::Array(rows.iter().map(|r| Value::Object(r.iter().map(|(k, v)| (k.clone(), v.clone())).collect())).collect()),
            );
        }
        Value::Object(obj)
    }

    /// Parse a flat-layout JSON document. Unknown top-level keys (e.g.
    /// `$schema`, `$base` metadata) are skipped.
    pub fn from_json(value: &Value) -> Result<Self> {
        let obj = value.as_object().ok_or_else(|| DbEditorError::ParseError {
            path: "<document>".to_string(),
            message: "expected a JSON object at the document root".to_string(),
        })?;
        let mut flat = FlatDataset::new();
        for (table, rows) in obj {
            if table.starts_with('$') {
                continue;
            }
            let arr = rows.as_array().ok_or_else(|| DbEditorError::ParseError {
                path: "<document>".to_string(),
                message: format!("expected an array at key '{}'", table),
            })?;
            let mut decoded = Vec::with_capacity(arr.len());
            for row in arr {
                let row_obj = row.as_object().ok_or_else(|| DbEditorError::ParseError {
                    path: "<document>".to_string(),
                    message: "expected a row object".to_string(),
                })?;
                decoded.push(row_obj.iter().map(|(k, v)| (k.clone(), v.clone())).collect());
            }
            flat.tables.insert(table.clone(), decoded);
        }
        Ok(flat)
    }
}

/// camelCase(root table name) -> ordered `NestedNode` sequence, plus a
/// record of which tables were truncated and by how much.
#[derive(Debug, Clone, Default)]
pub struct NestedDataset {
    pub roots: IndexMap<String, Vec<NestedNode>>,
    /// Table name (native, not camelCased) -> rows skipped by a `limit`.
    pub truncated: IndexMap<String, u64>,
}

impl NestedDataset {
    pub fn new() -> Self {
        Self {
            roots: IndexMap::new(),
            truncated: IndexMap::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum NestedNode {
    Row(NestedRow),
    Ref(RefMarker),
    Partial(PartialMarker),
}

/// Scalar columns (minus any FK columns implicit from nesting context)
/// plus, for each dominant child edge, `camelCase(child_table) ->
/// Vec<NestedNode>`.
#[derive(Debug, Clone, Default)]
pub struct NestedRow {
    pub columns: FlatRow,
    pub children: IndexMap<String, Vec<NestedNode>>,
}

impl NestedRow {
    /// Render as a single JSON object: scalar columns first, then child
    /// arrays — columns and child keys never collide (§3 invariant).
    pub fn to_json(&self) -> Value {
        let mut obj = serde_json::Map::new();
        for (k, v) in &self.columns {
            obj.insert(k.clone(), v.clone());
        }
        for (key, children) in &self.children {
            obj.insert(key.clone(), Value::Array(children.iter().map(NestedNode::to_json).collect()));
        }
        Value::Object(obj)
    }
}

/// A collapsed composition: a `$ref` standing in for a subtree that must
/// be reconstructible from primary-key alone.
#[derive(Debug, Clone)]
pub struct RefMarker {
    pub primary_key: FlatRow,
}

/// Marks a truncated sequence: `skipped` rows were omitted by a `limit`.
#[derive(Debug, Clone)]
pub struct PartialMarker {
    pub skipped: u64,
}

impl NestedNode {
    pub fn to_json(&self) -> Value {
        match self {
            NestedNode::Row(row) => row.to_json(),
            NestedNode::Ref(marker) => {
                let mut obj = serde_json::Map::new();
                obj.insert("$ref".to_string(), Value::Bool(true));
                for (k, v) in &marker.primary_key {
                    obj.insert(k.clone(), v.clone());
                }
                Value::Object(obj)
            }
            NestedNode::Partial(marker) => {
                let mut obj = serde_json::Map::new();
                obj.insert("$partial".to_string(), Value::Bool(true));
                obj.insert("skipped".to_string(), Value::from(marker.skipped));
                Value::Object(obj)
            }
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_row_renders_columns_then_children() {
        let mut row = NestedRow::default();
        row.columns.insert("id".to_string(), json!("o1"));
        row.columns.insert("name".to_string(), json!("Acme"));
        row.children.insert(
            "project".to_string(),
            vec![NestedNode::Row(NestedRow {
                columns: {
                    let mut c = FlatRow::new();
                    c.insert("id".to_string(), json!("p1"));
                    c
                },
                children: IndexMap::new(),
            })],
        );
        let json_val = row.to_json();
        assert_eq!(json_val["id"], json!("o1"));
        assert_eq!(json_val["project"][0]["id"], json!("p1"));
    }

    #[test]
    fn ref_marker_renders_with_tag() {
        let mut pk = FlatRow::new();
        pk.insert("id".to_string(), json!("x1"));
        let marker = NestedNode::Ref(RefMarker { primary_key: pk });
        let json_val = marker.to_json();
        assert_eq!(json_val["$ref"], json!(true));
        assert_eq!(json_val["id"], json!("x1"));
    }

    #[test]
    fn partial_marker_renders_with_skipped_count() {
        let marker = NestedNode::Partial(PartialMarker { skipped: 42 });
        let json_val = marker.to_json();
        assert_eq!(json_val["$partial"], json!(true));
        assert_eq!(json_val["skipped"], json!(42));
    }
}
