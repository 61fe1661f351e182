use anyhow::Result;
use db_editor_core::driver::PostgresDriver;

use crate::args::SyncArgs;
use crate::connect;

pub async fn run(args: &SyncArgs) -> Result<()> {
    let resolved = connect::resolve(args.db.as_deref(), args.schema.as_deref())?;
    let pool = connect::connect(&resolved.db_url).await?;
    let schema = connect::extract_schema(pool.clone(), &resolved.schema_name).await?;
    let tree = connect::build_tree(&resolved, &schema)?;
    let driver = PostgresDriver::new(pool);

    let preview = db_editor_core::sync::preview(&driver, &schema, &tree, &args.input).await?;
    if preview.is_empty() {
        println!("No changes.");
        return Ok(());
    }

    println!("{} statement(s) will be applied:", preview.len());
    for statement in &preview {
        println!("  {}", statement.sql);
    }

    if !args.yes && !confirm("Apply these changes?")? {
        println!("Aborted.");
        return Ok(());
    }

    let applied = db_editor_core::sync::sync(&driver, &driver, &schema, &tree, &args.input).await?;
    println!("Applied {} statement(s).", applied.len());
    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    use std::io::Write;
    print!("{} [y/N] ", prompt);
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(matches!(line.trim().to_lowercase().as_str(), "y" | "yes"))
}
