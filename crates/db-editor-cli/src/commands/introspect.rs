use anyhow::Result;
use comfy_table::{Cell, Table as ComfyTable};
use db_editor_core::graph::dag::is_composition;

use crate::args::{IntrospectArgs, IntrospectFormat};
use crate::connect;

pub async fn run(args: &IntrospectArgs) -> Result<()> {
    let resolved = connect::resolve(args.db.as_deref(), args.schema.as_deref())?;
    let pool = connect::connect(&resolved.db_url).await?;
    let schema = connect::extract_schema(pool, &resolved.schema_name).await?;
    let tree = connect::build_tree(&resolved, &schema)?;

    match args.format {
        IntrospectFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
        IntrospectFormat::Table => {
            println!(
                "Tables: {}  Relationships: {}  Root tables: {}",
                schema.table_count(),
                schema.relationship_count(),
                tree.roots().len()
            );
            println!("Roots: {}\n", tree.roots().join(", "));

            for (table_name, table) in &schema.tables {
                let dominance = match tree.parent_edge(table_name) {
                    Some(edge) => format!("owned by {}", edge.parent),
                    None => "root".to_string(),
                };
                println!("━━━ {} ({}) ━━━", table_name, dominance);

                let mut t = ComfyTable::new();
                t.set_header(vec!["Column", "Type", "Nullable", "PK", "Default", "Generated", "FK"]);

                for column in table.columns.values() {
                    let is_pk = table.primary_key.contains(&column.name);
                    let fk_target = schema.relationships_from(table_name).find_map(|rel| {
                        if rel.from_columns.contains(&column.name) {
                            let kind = if is_composition(rel) { "comp" } else { "ref" };
                            Some(format!("{} {} ({})", "→", rel.to_table, kind))
                        } else {
                            None
                        }
                    });

                    t.add_row(vec![
                        Cell::new(&column.name),
                        Cell::new(&column.raw_type),
                        Cell::new(if column.is_nullable { "YES" } else { "NO" }),
                        Cell::new(if is_pk { "PK" } else { "" }),
                        Cell::new(if column.has_default { "yes" } else { "" }),
                        Cell::new(if column.is_generated { "yes" } else { "" }),
                        Cell::new(fk_target.as_deref().unwrap_or("")),
                    ]);
                }

                println!("{}", t);
                println!();
            }
        }
    }

    Ok(())
}
