pub mod introspect;
pub mod postgres;
pub mod types;

pub use introspect::SchemaExtractor;
pub use postgres::PostgresExtractor;
pub use types::{Column, DataType, ForeignKeyAction, Relationship, Schema, Table, UniqueConstraint};
