//! Driver abstraction (spec §4.7, §9 Polymorphism): the sync orchestrator
//! talks to the database only through these two narrow traits, so it can
//! be exercised against an in-memory double in tests without a live
//! PostgreSQL instance.

use indexmap::IndexMap;
use sqlx::postgres::PgPool;
use sqlx::Row;

use crate::dataset::{FlatDataset, FlatRow};
use crate::emit::Statement;
use crate::error::{DbEditorError, Result};
use crate::pgvalue;
use crate::schema::types::Schema;

/// Reads every table's current rows, honoring an optional per-table limit.
pub trait RowFetcher: Send + Sync {
    fn fetch_all(
        &self,
        schema: &Schema,
        limit: Option<usize>,
    ) -> impl std::future::Future<Output = Result<(FlatDataset, IndexMap<String, u64>)>> + Send;
}

/// Runs a batch of statements as a single all-or-nothing transaction.
pub trait Executor: Send + Sync {
    fn apply(&self, schema: &Schema, statements: &[Statement]) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub struct PostgresDriver {
    pool: PgPool,
}

impl PostgresDriver {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl RowFetcher for PostgresDriver {
    async fn fetch_all(
        &self,
        schema: &Schema,
        limit: Option<usize>,
    ) -> Result<(FlatDataset, IndexMap<String, u64>)> {
        let mut flat = FlatDataset::new();
        let mut truncated = IndexMap::new();

        for (table_name, table) in &schema.tables {
            let order_by = if table.primary_key.is_empty() {
                String::new()
            } else {
                let cols: Vec<String> = table.primary_key.iter().map(|c| crate::emit::quote_identifier(c)).collect();
                format!(" ORDER BY {}", cols.join(", "))
            };

            let fetch_limit = limit.map(|n| n as i64 + 1);
            let sql = match fetch_limit {
                Some(n) => format!(
                    "SELECT * FROM {}{} LIMIT {}",
                    crate::emit::quote_identifier(table_name),
                    order_by,
                    n
                ),
                None => format!("SELECT * FROM {}{}", crate::emit::quote_identifier(table_name), order_by),
            };

            let rows = sqlx::query(&sql).fetch_all(&self.pool).await.map_err(|e| DbEditorError::DriverError {
                operation: format!("fetch rows for '{}'", table_name),
                source: e,
            })?;

            let mut decoded: Vec<FlatRow> = Vec::with_capacity(rows.len());
            for row in &rows {
                let mut flat_row = FlatRow::new();
                for column in table.columns.values() {
                    let value = pgvalue::decode_column(row, &column.name, &column.data_type)?;
                    flat_row.insert(column.name.clone(), value);
                }
                decoded.push(flat_row);
            }

            if let Some(n) = limit {
                if decoded.len() > n {
                    decoded.truncate(n);
                    let count_sql = format!("SELECT COUNT(*) AS n FROM {}", crate::emit::quote_identifier(table_name));
                    let count_row = sqlx::query(&count_sql).fetch_one(&self.pool).await.map_err(|e| DbEditorError::DriverError {
                        operation: format!("count rows for '{}'", table_name),
                        source: e,
                    })?;
                    let total: i64 = count_row.try_get("n").unwrap_or(0);
                    let skipped = (total as u64).saturating_sub(n as u64);
                    truncated.insert(table_name.clone(), skipped);
                }
            }

            flat.tables.insert(table_name.clone(), decoded);
        }

        Ok((flat, truncated))
    }
}

impl Executor for PostgresDriver {
    async fn apply(&self, schema: &Schema, statements: &[Statement]) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(|e| DbEditorError::DriverError {
            operation: "begin transaction".to_string(),
            source: e,
        })?;

        for statement in statements {
            let table = extract_table_name(&statement.sql);
            let columns = table.and_then(|t| schema.tables.get(t));
            let param_columns = extract_param_columns(&statement.sql);

            let mut query = sqlx::query(&statement.sql);
            for (i, value) in statement.params.iter().enumerate() {
                let data_type = param_columns
                    .get(i)
                    .and_then(|col_name| columns.and_then(|t| t.columns.get(col_name)))
                    .map(|c| &c.data_type);
                query = match data_type {
                    Some(dt) => pgvalue::bind_value(query, value, dt),
                    None => query.bind(value.clone()),
                };
            }

            query.execute(&mut *tx).await.map_err(|e| DbEditorError::DriverError {
                operation: format!("apply statement: {}", statement.sql),
                source: e,
            })?;
        }

        tx.commit().await.map_err(|e| DbEditorError::DriverError {
            operation: "commit transaction".to_string(),
            source: e,
        })?;

        Ok(())
    }
}

/// Best-effort extraction of the quoted table name from a generated
/// statement, to look up that table's column types for parameter binding.
fn extract_table_name(sql: &str) -> Option<&str> {
    let start = sql.find('"')? + 1;
    let rest = &sql[start..];
    let end = rest.find('"')?;
    Some(&rest[..end])
}

/// Recover, in positional order, which column each `$n` placeholder in a
/// generated statement binds to — `emit` always renders identifiers
/// immediately adjacent to their placeholder (`"col" = $n` or the INSERT
/// column list ahead of `VALUES`), so a pass over quoted identifiers in
/// statement order lines up with the params vector.
fn extract_param_columns(sql: &str) -> Vec<String> {
    if let Some(values_pos) = sql.find("VALUES") {
        // INSERT: column list is the parenthesized group right before VALUES.
        let before = &sql[..values_pos];
        let open = before.rfind('(').unwrap_or(0);
        let close = before.rfind(')').unwrap_or(before.len());
        return before[open + 1..close]
            .split(',')
            .map(|s| s.trim().trim_matches('"').replace("\"\"", "\""))
            .collect();
    }

    // UPDATE/DELETE: every `"col" = $n` occurrence, in appearance order.
    static RE: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
    let re = RE.get_or_init(|| regex::Regex::new(r#""((?:[^"]|"")*)"\s*=\s*\$\d+"#).unwrap());
    re.captures_iter(sql).map(|c| c[1].replace("\"\"", "\"")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_table_name_from_insert() {
        assert_eq!(extract_table_name(r#"INSERT INTO "user" ("id") VALUES ($1)"#), Some("user"));
    }

    #[test]
    fn extracts_table_name_from_update() {
        assert_eq!(extract_table_name(r#"UPDATE "project" SET "name" = $1 WHERE "id" = $2"#), Some("project"));
    }

    #[test]
    fn extracts_table_name_from_delete() {
        assert_eq!(extract_table_name(r#"DELETE FROM "task" WHERE "id" = $1"#), Some("task"));
    }

    #[test]
    fn extracts_insert_param_columns_in_order() {
        let sql = r#"INSERT INTO "user" ("id", "name") VALUES ($1, $2)"#;
        assert_eq!(extract_param_columns(sql), vec!["id", "name"]);
    }

    #[test]
    fn extracts_update_param_columns_set_then_where() {
        let sql = r#"UPDATE "User" SET "name" = $1, "email" = $2 WHERE "id" = $3"#;
        assert_eq!(extract_param_columns(sql), vec!["name", "email", "id"]);
    }

    #[test]
    fn extracts_delete_param_columns() {
        let sql = r#"DELETE FROM "membership" WHERE "a" = $1 AND "b" = $2"#;
        assert_eq!(extract_param_columns(sql), vec!["a", "b"]);
    }
}
