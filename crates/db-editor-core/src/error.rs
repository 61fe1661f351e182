//! # Error Types
//!
//! Defines `DbEditorError`, the unified error enum for every failure mode
//! in the dump/nest/diff/sync pipeline. Every variant carries enough
//! context (table name, query name, path) to debug without re-running.

use thiserror::Error;

/// All errors that can occur in db-editor operations.
#[derive(Error, Debug)]
pub enum DbEditorError {
    #[error("Schema extraction failed on query '{query}': {source}")]
    ExtractFailed {
        query: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Circular ownership detected: table '{table}' has no acyclic dominant composition\n  Override it in db-editor.toml:\n  [graph]\n  dominance_overrides = [\"{table}.<parent_table>\"]")]
    CyclicOwnership { table: String },

    #[error("Input is truncated: table '{table}' has a $partial marker ({skipped} rows skipped)\n  Re-dump without a --limit to get the full dataset before syncing")]
    TruncatedInput { table: String, skipped: u64 },

    #[error("Unknown table '{table}' referenced in input file")]
    UnknownTable { table: String },

    #[error("No base snapshot found at {path}\n  Use `reset` for a two-way sync against the live database, or run `dump` first")]
    MissingBase { path: String },

    #[error("A $ref marker for {table}.{pk:?} could not be resolved: no matching row exists in the database or the file")]
    UnresolvedRef { table: String, pk: String },

    #[error("Database error during {operation}: {source}")]
    DriverError {
        operation: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Failed to parse {path}: {message}")]
    ParseError { path: String, message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, DbEditorError>;
