use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Immutable snapshot of a database's structural metadata.
///
/// Built once per run by the extractor and never mutated afterward —
/// the ownership tree, nester, flattener, diff engine, and orderer all
/// borrow it read-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schema {
    pub tables: IndexMap<String, Table>,
    pub relationships: Vec<Relationship>,
}

impl Schema {
    pub fn new() -> Self {
        Self {
            tables: IndexMap::new(),
            relationships: Vec::new(),
        }
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    /// Relationships whose child side is `table_name`, in extraction order.
    pub fn relationships_from(&self, table_name: &str) -> impl Iterator<Item = &Relationship> + '_ {
        let table_name = table_name.to_string();
        self.relationships
            .iter()
            .filter(move |r| r.from_table == table_name)
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::new()
    }
}

/// A single database table: its columns, in ordinal position order, plus
/// its primary key column list (order significant, length 0 allowed).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub columns: IndexMap<String, Column>,
    pub primary_key: Vec<String>,
    pub unique_constraints: Vec<UniqueConstraint>,
}

impl Table {
    pub fn new(name: String) -> Self {
        Self {
            name,
            columns: IndexMap::new(),
            primary_key: Vec::new(),
            unique_constraints: Vec::new(),
        }
    }

    pub fn has_primary_key(&self) -> bool {
        !self.primary_key.is_empty()
    }
}

/// A single column in a table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data_type: DataType,
    /// Canonical native type name as reported by the database, e.g.
    /// `"character varying"` or `"timestamp with time zone"`.
    pub raw_type: String,
    pub is_nullable: bool,
    /// Server supplies a value when the column is omitted from an INSERT.
    pub has_default: bool,
    /// Server always computes the value; the column must never be written.
    pub is_generated: bool,
    pub ordinal_position: u32,
}

impl Column {
    pub fn new(name: String, data_type: DataType, raw_type: String) -> Self {
        Self {
            name,
            data_type,
            raw_type,
            is_nullable: true,
            has_default: false,
            is_generated: false,
            ordinal_position: 0,
        }
    }
}

/// Normalized data type, parsed from the database's native type name.
///
/// Used for diagnostics (introspect/check output) — the diff, nest, and
/// flatten paths only ever care about the scalar `Value` a cell holds,
/// never this enum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    SmallInt,
    Integer,
    BigInt,
    Float,
    Double,
    Numeric,
    Char,
    VarChar,
    Text,
    Boolean,
    Date,
    Time,
    Timestamp,
    TimestampTz,
    Uuid,
    Json,
    Jsonb,
    Binary,
    Array(Box<DataType>),
    Enum(String),
    Unknown(String),
}

impl DataType {
    /// Parse a raw SQL type string into a normalized `DataType`.
    pub fn from_raw(raw: &str) -> Self {
        let normalized = raw.trim().to_lowercase();
        let normalized = normalized.as_str();

        if let Some(inner) = normalized.strip_suffix("[]") {
            return DataType::Array(Box::new(DataType::from_raw(inner)));
        }
        if let Some(inner) = normalized.strip_prefix('_') {
            if !inner.is_empty() {
                return DataType::Array(Box::new(DataType::from_raw(inner)));
            }
        }

        match normalized {
            "smallint" | "int2" | "smallserial" | "serial2" => DataType::SmallInt,
            "integer" | "int" | "int4" => DataType::Integer,
            "bigint" | "int8" | "bigserial" | "serial8" => DataType::BigInt,
            "serial" | "serial4" => DataType::Integer,
            "real" | "float4" => DataType::Float,
            "double precision" | "float8" => DataType::Double,
            s if s.starts_with("numeric") || s.starts_with("decimal") => DataType::Numeric,
            s if s.starts_with("character varying") || s.starts_with("varchar") => {
                DataType::VarChar
            }
            s if s.starts_with("char") || s.starts_with("character(") => DataType::Char,
            "text" => DataType::Text,
            "boolean" | "bool" => DataType::Boolean,
            "date" => DataType::Date,
            "time" | "time without time zone" => DataType::Time,
            "timestamp" | "timestamp without time zone" => DataType::Timestamp,
            "timestamp with time zone" | "timestamptz" => DataType::TimestampTz,
            "uuid" => DataType::Uuid,
            "json" => DataType::Json,
            "jsonb" => DataType::Jsonb,
            "bytea" => DataType::Binary,
            "user-defined" => DataType::Unknown("USER-DEFINED".to_string()),
            other => DataType::Unknown(other.to_string()),
        }
    }

    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            DataType::Date | DataType::Time | DataType::Timestamp | DataType::TimestampTz
        )
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::SmallInt => write!(f, "smallint"),
            DataType::Integer => write!(f, "integer"),
            DataType::BigInt => write!(f, "bigint"),
            DataType::Float => write!(f, "real"),
            DataType::Double => write!(f, "double precision"),
            DataType::Numeric => write!(f, "numeric"),
            DataType::Char => write!(f, "char"),
            DataType::VarChar => write!(f, "varchar"),
            DataType::Text => write!(f, "text"),
            DataType::Boolean => write!(f, "boolean"),
            DataType::Date => write!(f, "date"),
            DataType::Time => write!(f, "time"),
            DataType::Timestamp => write!(f, "timestamp"),
            DataType::TimestampTz => write!(f, "timestamptz"),
            DataType::Uuid => write!(f, "uuid"),
            DataType::Json => write!(f, "json"),
            DataType::Jsonb => write!(f, "jsonb"),
            DataType::Binary => write!(f, "bytea"),
            DataType::Array(inner) => write!(f, "{}[]", inner),
            DataType::Enum(name) => write!(f, "enum({})", name),
            DataType::Unknown(s) => write!(f, "{}", s),
        }
    }
}

/// A foreign key: `k` child columns paired ordinally with `k` parent
/// columns. The parent side must be a key of `to_table` (typically its
/// primary key).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    /// Constraint name, unique within the schema.
    pub id: String,
    pub from_table: String,
    pub from_columns: Vec<String>,
    pub to_table: String,
    pub to_columns: Vec<String>,
    pub on_delete: ForeignKeyAction,
    pub on_update: ForeignKeyAction,
}

impl Relationship {
    pub fn arity(&self) -> usize {
        self.from_columns.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForeignKeyAction {
    NoAction,
    Restrict,
    Cascade,
    SetNull,
    SetDefault,
}

impl ForeignKeyAction {
    pub fn parse_action(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "CASCADE" => ForeignKeyAction::Cascade,
            "SET NULL" => ForeignKeyAction::SetNull,
            "SET DEFAULT" => ForeignKeyAction::SetDefault,
            "RESTRICT" => ForeignKeyAction::Restrict,
            _ => ForeignKeyAction::NoAction,
        }
    }
}

impl fmt::Display for ForeignKeyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForeignKeyAction::NoAction => write!(f, "NO ACTION"),
            ForeignKeyAction::Restrict => write!(f, "RESTRICT"),
            ForeignKeyAction::Cascade => write!(f, "CASCADE"),
            ForeignKeyAction::SetNull => write!(f, "SET NULL"),
            ForeignKeyAction::SetDefault => write!(f, "SET DEFAULT"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UniqueConstraint {
    pub name: Option<String>,
    pub columns: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_array_types() {
        assert_eq!(
            DataType::from_raw("integer[]"),
            DataType::Array(Box::new(DataType::Integer))
        );
        assert_eq!(
            DataType::from_raw("_text"),
            DataType::Array(Box::new(DataType::Text))
        );
    }

    #[test]
    fn parses_scalar_types() {
        assert_eq!(DataType::from_raw("character varying(255)"), DataType::VarChar);
        assert_eq!(DataType::from_raw("TIMESTAMP WITH TIME ZONE"), DataType::TimestampTz);
        assert_eq!(DataType::from_raw("numeric(10,2)"), DataType::Numeric);
    }

    #[test]
    fn relationship_arity_matches_column_count() {
        let rel = Relationship {
            id: "fk1".to_string(),
            from_table: "orders".to_string(),
            from_columns: vec!["user_id".to_string()],
            to_table: "users".to_string(),
            to_columns: vec!["id".to_string()],
            on_delete: ForeignKeyAction::Cascade,
            on_update: ForeignKeyAction::NoAction,
        };
        assert_eq!(rel.arity(), 1);
    }
}
