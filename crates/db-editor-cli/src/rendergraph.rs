//! Renders the classified table dependency graph as Mermaid ER syntax,
//! Graphviz DOT, or a plain-text tree — diagnostic only, grounded on the
//! teacher's `graph` command (spec §1: "Mermaid ER rendering" is named as
//! an external-collaborator responsibility, so it lives in this binary).

use db_editor_core::graph::dag::is_composition;
use db_editor_core::graph::tree::OwnershipTree;
use db_editor_core::schema::types::Schema;

pub fn render_mermaid(schema: &Schema) -> String {
    let mut out = String::from("erDiagram\n");
    for rel in &schema.relationships {
        let verb = if is_composition(rel) { "||--o{" } else { "}o--o{" };
        out.push_str(&format!(
            "    {} {} {} : \"{}\"\n",
            rel.to_table, verb, rel.from_table, rel.id
        ));
    }
    for table_name in schema.tables.keys() {
        out.push_str(&format!("    {} {{\n", table_name));
        if let Some(table) = schema.tables.get(table_name) {
            for column in table.columns.values() {
                let key_marker = if table.primary_key.contains(&column.name) { " PK" } else { "" };
                out.push_str(&format!("        {} {}{}\n", column.raw_type.replace(' ', "_"), column.name, key_marker));
            }
        }
        out.push_str("    }\n");
    }
    out
}

pub fn render_dot(schema: &Schema, tree: &OwnershipTree) -> String {
    let mut out = String::from("digraph ownership {\n    rankdir=BT;\n");
    for table_name in schema.tables.keys() {
        out.push_str(&format!("    \"{}\";\n", table_name));
    }
    for rel in &schema.relationships {
        let dominant = tree
            .parent_edge(&rel.from_table)
            .map(|e| e.relationship.id == rel.id)
            .unwrap_or(false);
        let style = if dominant {
            "color=black,penwidth=2"
        } else if is_composition(rel) {
            "color=gray,style=dashed"
        } else {
            "color=gray,style=dotted"
        };
        out.push_str(&format!(
            "    \"{}\" -> \"{}\" [label=\"{}\",{}];\n",
            rel.from_table, rel.to_table, rel.id, style
        ));
    }
    out.push_str("}\n");
    out
}

pub fn render_text(schema: &Schema, tree: &OwnershipTree) -> String {
    let _ = schema;
    tree.describe()
}
