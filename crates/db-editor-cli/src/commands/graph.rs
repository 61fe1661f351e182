use anyhow::Result;

use crate::args::{GraphArgs, GraphFormat};
use crate::connect;
use crate::rendergraph;

pub async fn run(args: &GraphArgs) -> Result<()> {
    let resolved = connect::resolve(args.db.as_deref(), args.schema.as_deref())?;
    let pool = connect::connect(&resolved.db_url).await?;
    let schema = connect::extract_schema(pool, &resolved.schema_name).await?;
    let tree = connect::build_tree(&resolved, &schema)?;

    let output = match args.format {
        GraphFormat::Mermaid => rendergraph::render_mermaid(&schema),
        GraphFormat::Dot => rendergraph::render_dot(&schema, &tree),
        GraphFormat::Text => rendergraph::render_text(&schema, &tree),
    };

    println!("{}", output);
    Ok(())
}
