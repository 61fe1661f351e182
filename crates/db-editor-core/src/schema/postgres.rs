use indexmap::IndexMap;
use sqlx::postgres::PgPool;
use sqlx::Row;

use crate::error::{DbEditorError, Result};
use crate::schema::introspect::SchemaExtractor;
use crate::schema::types::*;

/// Extracts a `Schema` from a live PostgreSQL-compatible database by
/// querying `information_schema` and the `pg_catalog`.
pub struct PostgresExtractor {
    pool: PgPool,
    schema_name: String,
}

impl PostgresExtractor {
    pub fn new(pool: PgPool) -> Self {
        Self::with_schema(pool, "public".to_string())
    }

    pub fn with_schema(pool: PgPool, schema_name: String) -> Self {
        Self { pool, schema_name }
    }

    async fn extract_tables(&self) -> Result<IndexMap<String, Table>> {
        let query = "SELECT table_name FROM information_schema.tables \
                     WHERE table_schema = $1 AND table_type = 'BASE TABLE' \
                     ORDER BY table_name";
        let rows = sqlx::query(query)
            .bind(&self.schema_name)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DbEditorError::ExtractFailed {
                query: "fetch tables".to_string(),
                source: e,
            })?;

        let mut tables = IndexMap::new();
        for row in rows {
            let name: String = row.get("table_name");
            tables.insert(name.clone(), Table::new(name));
        }
        Ok(tables)
    }

    async fn extract_columns(&self, tables: &mut IndexMap<String, Table>) -> Result<()> {
        let query = r#"
            SELECT
                c.table_name,
                c.column_name,
                c.data_type,
                c.udt_name,
                c.is_nullable,
                c.column_default,
                c.is_generated,
                c.ordinal_position
            FROM information_schema.columns c
            WHERE c.table_schema = $1
            ORDER BY c.table_name, c.ordinal_position
        "#;

        let rows = sqlx::query(query)
            .bind(&self.schema_name)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DbEditorError::ExtractFailed {
                query: "fetch columns".to_string(),
                source: e,
            })?;

        for row in rows {
            let table_name: String = row.get("table_name");
            let column_name: String = row.get("column_name");
            let data_type_str: String = row.get("data_type");
            let udt_name: String = row.get("udt_name");
            let is_nullable: String = row.get("is_nullable");
            let column_default: Option<String> = row.get("column_default");
            let is_generated: String = row.get("is_generated");
            let ordinal_position: i32 = row.get("ordinal_position");

            let data_type = if data_type_str == "USER-DEFINED" {
                DataType::Enum(udt_name.clone())
            } else if data_type_str == "ARRAY" {
                let inner_type = if let Some(stripped) = udt_name.strip_prefix('_') {
                    DataType::from_raw(stripped)
                } else {
                    DataType::from_raw(&udt_name)
                };
                DataType::Array(Box::new(inner_type))
            } else {
                DataType::from_raw(&data_type_str)
            };

            let mut column = Column::new(column_name.clone(), data_type, data_type_str.clone());
            column.is_nullable = is_nullable == "YES";
            column.has_default = column_default.is_some();
            column.is_generated = is_generated == "ALWAYS";
            column.ordinal_position = ordinal_position as u32;

            if let Some(table) = tables.get_mut(&table_name) {
                table.columns.insert(column_name, column);
            }
        }

        Ok(())
    }

    async fn extract_primary_keys(&self, tables: &mut IndexMap<String, Table>) -> Result<()> {
        let query = r#"
            SELECT
                tc.table_name,
                kcu.column_name,
                kcu.ordinal_position
            FROM information_schema.table_constraints tc
            JOIN information_schema.key_column_usage kcu
                ON tc.constraint_name = kcu.constraint_name
                AND tc.table_schema = kcu.table_schema
            WHERE tc.table_schema = $1
                AND tc.constraint_type = 'PRIMARY KEY'
            ORDER BY tc.table_name, kcu.ordinal_position
        "#;

        let rows = sqlx::query(query)
            .bind(&self.schema_name)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DbEditorError::ExtractFailed {
                query: "fetch primary keys".to_string(),
                source: e,
            })?;

        let mut pk_map: IndexMap<String, Vec<String>> = IndexMap::new();
        for row in rows {
            let table_name: String = row.get("table_name");
            let column_name: String = row.get("column_name");
            pk_map.entry(table_name).or_default().push(column_name);
        }

        for (table_name, columns) in pk_map {
            if let Some(table) = tables.get_mut(&table_name) {
                table.primary_key = columns;
            }
        }

        Ok(())
    }

    async fn extract_foreign_keys(&self) -> Result<Vec<Relationship>> {
        let query = r#"
            SELECT
                tc.table_name,
                tc.constraint_name,
                kcu.column_name,
                ccu.table_name AS referenced_table_name,
                ccu.column_name AS referenced_column_name,
                rc.delete_rule,
                rc.update_rule
            FROM information_schema.table_constraints tc
            JOIN information_schema.key_column_usage kcu
                ON tc.constraint_name = kcu.constraint_name
                AND tc.table_schema = kcu.table_schema
            JOIN information_schema.constraint_column_usage ccu
                ON tc.constraint_name = ccu.constraint_name
                AND tc.table_schema = ccu.table_schema
            JOIN information_schema.referential_constraints rc
                ON tc.constraint_name = rc.constraint_name
                AND tc.table_schema = rc.constraint_schema
            WHERE tc.table_schema = $1
                AND tc.constraint_type = 'FOREIGN KEY'
            ORDER BY tc.table_name, tc.constraint_name, kcu.ordinal_position
        "#;

        let rows = sqlx::query(query)
            .bind(&self.schema_name)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DbEditorError::ExtractFailed {
                query: "fetch foreign keys".to_string(),
                source: e,
            })?;

        // Group by (table_name, constraint_name) — a composite FK spans
        // several rows, one per column pair, in ordinal order.
        let mut fk_map: IndexMap<(String, String), Relationship> = IndexMap::new();
        for row in rows {
            let table_name: String = row.get("table_name");
            let constraint_name: String = row.get("constraint_name");
            let column_name: String = row.get("column_name");
            let ref_table: String = row.get("referenced_table_name");
            let ref_column: String = row.get("referenced_column_name");
            let delete_rule: String = row.get("delete_rule");
            let update_rule: String = row.get("update_rule");

            let key = (table_name.clone(), constraint_name.clone());
            let entry = fk_map.entry(key).or_insert_with(|| Relationship {
                id: constraint_name,
                from_table: table_name,
                from_columns: Vec::new(),
                to_table: ref_table,
                to_columns: Vec::new(),
                on_delete: ForeignKeyAction::parse_action(&delete_rule),
                on_update: ForeignKeyAction::parse_action(&update_rule),
            });
            entry.from_columns.push(column_name);
            entry.to_columns.push(ref_column);
        }

        Ok(fk_map.into_values().collect())
    }

    async fn extract_unique_constraints(&self, tables: &mut IndexMap<String, Table>) -> Result<()> {
        let query = r#"
            SELECT
                tc.table_name,
                tc.constraint_name,
                kcu.column_name,
                kcu.ordinal_position
            FROM information_schema.table_constraints tc
            JOIN information_schema.key_column_usage kcu
                ON tc.constraint_name = kcu.constraint_name
                AND tc.table_schema = kcu.table_schema
            WHERE tc.table_schema = $1
                AND tc.constraint_type = 'UNIQUE'
            ORDER BY tc.table_name, tc.constraint_name, kcu.ordinal_position
        "#;

        let rows = sqlx::query(query)
            .bind(&self.schema_name)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DbEditorError::ExtractFailed {
                query: "fetch unique constraints".to_string(),
                source: e,
            })?;

        let mut uc_map: IndexMap<(String, String), Vec<String>> = IndexMap::new();
        for row in rows {
            let table_name: String = row.get("table_name");
            let constraint_name: String = row.get("constraint_name");
            let column_name: String = row.get("column_name");
            uc_map
                .entry((table_name, constraint_name))
                .or_default()
                .push(column_name);
        }

        for ((table_name, constraint_name), columns) in uc_map {
            if let Some(table) = tables.get_mut(&table_name) {
                table.unique_constraints.push(UniqueConstraint {
                    name: Some(constraint_name),
                    columns,
                });
            }
        }

        Ok(())
    }
}

impl SchemaExtractor for PostgresExtractor {
    async fn extract(&self) -> Result<Schema> {
        let mut schema = Schema::new();

        schema.tables = self.extract_tables().await?;
        self.extract_columns(&mut schema.tables).await?;
        self.extract_primary_keys(&mut schema.tables).await?;
        schema.relationships = self.extract_foreign_keys().await?;
        self.extract_unique_constraints(&mut schema.tables).await?;

        Ok(schema)
    }
}
