//! Generates the JSON-schema companion file for editor autocomplete
//! (spec §1, §6). The core only knows how to *write* a pre-rendered
//! string verbatim; deriving one from a `Schema` is this binary's job.

use db_editor_core::camel::to_camel_case;
use db_editor_core::graph::tree::OwnershipTree;
use db_editor_core::schema::types::{Column, DataType, Schema};
use serde_json::{json, Value};

/// Render a draft-07 JSON Schema describing the nested-layout document
/// `dump` produces for this schema/tree pair.
pub fn render_nested(schema: &Schema, tree: &OwnershipTree) -> Value {
    let mut properties = serde_json::Map::new();
    properties.insert("$schema".to_string(), json!({ "type": "string" }));
    properties.insert("$base".to_string(), json!({ "type": "string" }));

    for root in tree.roots() {
        properties.insert(to_camel_case(root), json!({ "type": "array", "items": row_schema(root, schema, tree) }));
    }

    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "title": "db-editor nested export",
        "type": "object",
        "properties": Value::Object(properties),
        "additionalProperties": false,
    })
}

/// Render a draft-07 JSON Schema describing the flat-layout document.
pub fn render_flat(schema: &Schema) -> Value {
    let mut properties = serde_json::Map::new();
    properties.insert("$schema".to_string(), json!({ "type": "string" }));
    properties.insert("$base".to_string(), json!({ "type": "string" }));

    for (table_name, table) in &schema.tables {
        let mut row_properties = serde_json::Map::new();
        for column in table.columns.values() {
            row_properties.insert(column.name.clone(), column_schema(column));
        }
        properties.insert(
            table_name.clone(),
            json!({ "type": "array", "items": { "type": "object", "properties": Value::Object(row_properties) } }),
        );
    }

    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "title": "db-editor flat export",
        "type": "object",
        "properties": Value::Object(properties),
        "additionalProperties": false,
    })
}

fn row_schema(table_name: &str, schema: &Schema, tree: &OwnershipTree) -> Value {
    let mut properties = serde_json::Map::new();
    let parent_fk_columns: std::collections::HashSet<&str> = tree
        .parent_edge(table_name)
        .map(|e| e.relationship.from_columns.iter().map(|c| c.as_str()).collect())
        .unwrap_or_default();

    if let Some(table) = schema.tables.get(table_name) {
        for column in table.columns.values() {
            if parent_fk_columns.contains(column.name.as_str()) {
                continue;
            }
            properties.insert(column.name.clone(), column_schema(column));
        }
    }

    for edge in tree.children_of(table_name) {
        properties.insert(
            to_camel_case(&edge.child),
            json!({ "type": "array", "items": row_schema(&edge.child, schema, tree) }),
        );
    }

    json!({ "type": "object", "properties": Value::Object(properties) })
}

fn column_schema(column: &Column) -> Value {
    let scalar_type = match &column.data_type {
        DataType::SmallInt | DataType::Integer | DataType::BigInt => "integer",
        DataType::Float | DataType::Double | DataType::Numeric => "number",
        DataType::Boolean => "boolean",
        DataType::Json | DataType::Jsonb => "object",
        DataType::Array(_) => "array",
        _ => "string",
    };
    if column.is_nullable {
        json!({ "type": [scalar_type, "null"] })
    } else {
        json!({ "type": scalar_type })
    }
}
