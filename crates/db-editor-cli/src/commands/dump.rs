use anyhow::Result;
use db_editor_core::driver::PostgresDriver;

use crate::args::DumpArgs;
use crate::connect;
use crate::jsonschema;

pub async fn run(args: &DumpArgs) -> Result<()> {
    let resolved = connect::resolve(args.db.as_deref(), args.schema.as_deref())?;
    let pool = connect::connect(&resolved.db_url).await?;
    let schema = connect::extract_schema(pool.clone(), &resolved.schema_name).await?;
    let tree = connect::build_tree(&resolved, &schema)?;
    let driver = PostgresDriver::new(pool);

    let companion = if args.no_schema_companion {
        None
    } else if args.flat {
        Some(serde_json::to_string_pretty(&jsonschema::render_flat(&schema))?)
    } else {
        Some(serde_json::to_string_pretty(&jsonschema::render_nested(&schema, &tree))?)
    };

    db_editor_core::sync::dump(
        &driver,
        &schema,
        &tree,
        &args.output,
        args.limit,
        args.nested_limit,
        args.flat,
        false,
        companion.as_deref(),
    )
    .await?;

    write_schema_snapshot(&args.output, &schema)?;

    println!(
        "Dumped {} table(s) to {} ({} layout)",
        schema.table_count(),
        args.output.display(),
        if args.flat { "flat" } else { "nested" }
    );
    Ok(())
}

/// Record the raw `Schema` alongside the base snapshot so a later `check`
/// can diff the live database's structure against what was last dumped.
/// Diagnostic only — never read by `preview`/`sync`/`reset`.
fn write_schema_snapshot(output_path: &std::path::Path, schema: &db_editor_core::schema::types::Schema) -> Result<()> {
    let stem = output_path.file_stem().and_then(|s| s.to_str()).unwrap_or("data");
    let dir = output_path.parent().unwrap_or_else(|| std::path::Path::new(".")).join(".db-editor");
    std::fs::create_dir_all(&dir)?;
    let path = dir.join(format!("{}.schema-snapshot.json", stem));
    std::fs::write(path, serde_json::to_string_pretty(schema)?)?;
    Ok(())
}
