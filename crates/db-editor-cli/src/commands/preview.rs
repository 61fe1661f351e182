use anyhow::Result;
use db_editor_core::driver::PostgresDriver;

use crate::args::PreviewArgs;
use crate::connect;

pub async fn run(args: &PreviewArgs) -> Result<()> {
    let resolved = connect::resolve(args.db.as_deref(), args.schema.as_deref())?;
    let pool = connect::connect(&resolved.db_url).await?;
    let schema = connect::extract_schema(pool.clone(), &resolved.schema_name).await?;
    let tree = connect::build_tree(&resolved, &schema)?;
    let driver = PostgresDriver::new(pool);

    let statements = db_editor_core::sync::preview(&driver, &schema, &tree, &args.input).await?;

    if statements.is_empty() {
        println!("No changes.");
        return Ok(());
    }

    for statement in &statements {
        println!("{}", statement.sql);
        if !statement.params.is_empty() {
            let params: Vec<String> = statement.params.iter().map(|p| p.to_string()).collect();
            println!("  params: [{}]", params.join(", "));
        }
    }
    println!("\n{} statement(s)", statements.len());
    Ok(())
}
