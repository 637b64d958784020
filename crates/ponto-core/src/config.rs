//! Table configuration for encoding scans.
//!
//! The store's schema belongs to the host application, so the tables and
//! columns to scan are configuration. [`EncodingConfig::default`] covers the
//! timesheet tables; a YAML or JSON file can replace it.
//!
//! ```yaml
//! tables:
//!   - name: utilizadores
//!     id_column: user_id
//!     columns: [nome, email]
//!   - name: timesheet
//!     columns: [description]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};
use crate::logging::subsystems;
use crate::models::TableSchema;

/// Tables scanned by the check, diagnose and fix operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodingConfig {
    pub tables: Vec<TableSchema>,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            tables: vec![
                TableSchema::new("users", &["first_name", "last_name", "email", "role"]),
                TableSchema::new("clients", &["name", "description"]),
                TableSchema::new("projects", &["name", "description"]),
                TableSchema::new("time_entries", &["description", "notes"]),
                TableSchema::new("groups", &["name", "description"]),
                TableSchema::new("categories", &["name", "description"]),
            ],
        }
    }
}

impl EncodingConfig {
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(s)?;
        config.validate()
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()
    }

    /// Load from a `.json`, `.yaml` or `.yml` file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content)?,
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content)?,
            other => {
                return Err(Error::Config(format!(
                    "unsupported schema file extension: {:?}",
                    other
                )))
            }
        };
        info!(
            subsystem = subsystems::CONFIG,
            path = %path.display(),
            tables = config.tables.len(),
            "Loaded encoding table configuration"
        );
        Ok(config)
    }

    /// `ENCODING_SCHEMA_FILE` when set, otherwise the defaults.
    pub fn from_env() -> Result<Self> {
        match std::env::var("ENCODING_SCHEMA_FILE") {
            Ok(path) if !path.trim().is_empty() => Self::from_file(Path::new(path.trim())),
            _ => Ok(Self::default()),
        }
    }

    /// Keep only the named tables, in configuration order.
    ///
    /// Unknown names are an error so a typo is not silently ignored.
    pub fn restrict(&self, names: &[&str]) -> Result<Vec<TableSchema>> {
        if let Some(unknown) = names
            .iter()
            .find(|n| !self.tables.iter().any(|t| t.name == **n))
        {
            return Err(Error::InvalidInput(format!(
                "table '{}' is not configured for encoding scans",
                unknown
            )));
        }
        Ok(self
            .tables
            .iter()
            .filter(|t| names.contains(&t.name.as_str()))
            .cloned()
            .collect())
    }

    fn validate(self) -> Result<Self> {
        if self.tables.is_empty() {
            return Err(Error::Config("no tables configured".to_string()));
        }
        for (i, table) in self.tables.iter().enumerate() {
            if table.columns.is_empty() {
                return Err(Error::Config(format!(
                    "table '{}' lists no columns",
                    table.name
                )));
            }
            if self.tables[..i].iter().any(|t| t.name == table.name) {
                return Err(Error::Config(format!(
                    "table '{}' configured twice",
                    table.name
                )));
            }
        }
        Ok(self)
    }
}
