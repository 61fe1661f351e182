//! # Configuration File Parser
//!
//! Reads and parses `db-editor.toml`, the optional project configuration
//! file. Supports:
//!
//! - `[database]` — default connection URL and schema namespace
//! - `[sync]` — default base-snapshot directory
//! - `[graph]` — explicit dominance overrides for multi-parent children
//!
//! Example `db-editor.toml`:
//!
//! ```toml
//! [database]
//! url = "postgres://localhost/myapp"
//! schema = "public"
//!
//! [sync]
//! base_dir = ".db-editor"
//!
//! [graph]
//! dominance_overrides = ["membership.user"]
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::{DbEditorError, Result};

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = "db-editor.toml";

/// Top-level db-editor.toml structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DbEditorConfig {
    pub database: DatabaseConfig,
    pub sync: SyncConfig,
    pub graph: GraphConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub schema: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Directory (relative to the user-facing file) that holds the base
    /// snapshot. Defaults to `.db-editor` per spec §6.
    pub base_dir: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Explicit dominant-parent overrides, each `"child_table.parent_table"`.
    ///
    /// Lets a user pin the dominant composition for a multi-parent child
    /// instead of relying on the arity/alphabetical tie-break — the
    /// officially out-of-scope "override dominance" escape hatch for
    /// `CyclicOwnership`.
    pub dominance_overrides: Vec<String>,
}

impl DbEditorConfig {
    /// Parse `dominance_overrides` entries into (child, parent) pairs.
    ///
    /// Malformed entries (missing the `.` separator) are logged and
    /// skipped rather than silently dropped.
    pub fn dominance_override_edges(&self) -> Vec<(String, String)> {
        self.graph
            .dominance_overrides
            .iter()
            .filter_map(|entry| {
                let parts: Vec<&str> = entry.splitn(2, '.').collect();
                if parts.len() == 2 {
                    Some((parts[0].to_string(), parts[1].to_string()))
                } else {
                    tracing::warn!(
                        "Invalid graph.dominance_overrides entry: '{}'. \
                         Expected format 'child_table.parent_table'. Ignoring.",
                        entry
                    );
                    None
                }
            })
            .collect()
    }
}

/// Read and parse a db-editor.toml file from the given directory.
///
/// Returns `None` if the file doesn't exist (config is optional).
pub fn read_config(dir: &Path) -> Result<Option<DbEditorConfig>> {
    let path = dir.join(CONFIG_FILE_NAME);
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(&path).map_err(|e| DbEditorError::Io {
        path: path.display().to_string(),
        source: e,
    })?;

    let config: DbEditorConfig = toml::from_str(&content).map_err(|e| DbEditorError::Config {
        message: format!("failed to parse {}: {}", path.display(), e),
    })?;

    Ok(Some(config))
}
