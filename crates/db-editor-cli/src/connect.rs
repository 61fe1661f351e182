//! Shared connection/schema-resolution helpers every subcommand uses:
//! resolve a database URL from `--db` / `DATABASE_URL` / `db-editor.toml`,
//! open a pool, and extract the schema + ownership tree.

use anyhow::{Context, Result};
use db_editor_core::config::{read_config, DbEditorConfig};
use db_editor_core::graph::tree::OwnershipTree;
use db_editor_core::schema::introspect::SchemaExtractor;
use db_editor_core::schema::postgres::PostgresExtractor;
use db_editor_core::schema::types::Schema;
use sqlx::postgres::PgPool;

pub struct Resolved {
    pub db_url: String,
    pub schema_name: String,
    pub config: Option<DbEditorConfig>,
}

pub fn resolve(db: Option<&str>, schema: Option<&str>) -> Result<Resolved> {
    let config = read_config(&std::env::current_dir()?)?;

    let db_url = db
        .map(|s| s.to_string())
        .or_else(|| config.as_ref().and_then(|c| c.database.url.clone()))
        .context("No database URL given. Pass --db, set DATABASE_URL, or add [database] url to db-editor.toml")?;

    let schema_name = schema
        .map(|s| s.to_string())
        .or_else(|| config.as_ref().and_then(|c| c.database.schema.clone()))
        .unwrap_or_else(|| "public".to_string());

    Ok(Resolved { db_url, schema_name, config })
}

pub async fn connect(db_url: &str) -> Result<PgPool> {
    sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(db_url)
        .await
        .context("Failed to connect to PostgreSQL")
}

pub async fn extract_schema(pool: PgPool, schema_name: &str) -> Result<Schema> {
    let extractor = PostgresExtractor::with_schema(pool, schema_name.to_string());
    Ok(extractor.extract().await?)
}

/// Build the ownership tree, honoring `db-editor.toml`'s `[graph]
/// dominance_overrides` escape hatch for `CyclicOwnership`/multi-parent
/// pinning (spec §7 names this out of scope at the core-contract level;
/// the ambient config layer supplies it).
pub fn build_tree(resolved: &Resolved, schema: &Schema) -> Result<OwnershipTree> {
    let overrides = resolved
        .config
        .as_ref()
        .map(|c| c.dominance_override_edges())
        .unwrap_or_default();
    Ok(OwnershipTree::build_with_overrides(schema, &overrides)?)
}
