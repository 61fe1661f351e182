use anyhow::Result;
use db_editor_core::driver::PostgresDriver;

use crate::args::ResetArgs;
use crate::connect;

pub async fn run(args: &ResetArgs) -> Result<()> {
    let resolved = connect::resolve(args.db.as_deref(), args.schema.as_deref())?;
    let pool = connect::connect(&resolved.db_url).await?;
    let schema = connect::extract_schema(pool.clone(), &resolved.schema_name).await?;
    let tree = connect::build_tree(&resolved, &schema)?;
    let driver = PostgresDriver::new(pool);

    if !args.yes {
        print!(
            "This will make the database match {} exactly, deleting any row not present there. Continue? [y/N] ",
            args.input.display()
        );
        use std::io::Write;
        std::io::stdout().flush()?;
        let mut line = String::new();
        std::io::stdin().read_line(&mut line)?;
        if !matches!(line.trim().to_lowercase().as_str(), "y" | "yes") {
            println!("Aborted.");
            return Ok(());
        }
    }

    let applied = db_editor_core::sync::reset(&driver, &driver, &schema, &tree, &args.input).await?;
    if applied.is_empty() {
        println!("No changes.");
    } else {
        println!("Applied {} statement(s).", applied.len());
    }
    Ok(())
}
