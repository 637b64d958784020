//! Data models for encoding scans and repairs.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::encoding::CorruptionSignature;

// =============================================================================
// SCHEMA DESCRIPTORS
// =============================================================================

fn default_id_column() -> String {
    defaults::ID_COLUMN.to_string()
}

/// A table to scan: its name, the column that identifies a row, and the
/// text columns to examine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    #[serde(default = "default_id_column")]
    pub id_column: String,
    pub columns: Vec<String>,
}

impl TableSchema {
    pub fn new(name: &str, columns: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            id_column: default_id_column(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn with_id_column(mut self, id_column: &str) -> Self {
        self.id_column = id_column.to_string();
        self
    }
}

/// Primary key value of a scanned row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowId {
    Integer(i64),
    Text(String),
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowId::Integer(id) => write!(f, "{}", id),
            RowId::Text(id) => write!(f, "{}", id),
        }
    }
}

// =============================================================================
// PER-TABLE RESULTS
// =============================================================================

/// Outcome of visiting one configured table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    /// The table was read (possibly with soft failures on some rows).
    Checked,
    /// The table does not exist in the store.
    NotFound,
    /// The table exists but could not be read.
    Failed,
}

/// Counts for one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableReport {
    pub table: String,
    pub status: TableStatus,
    pub rows_scanned: usize,
    pub fields_examined: usize,
    pub fields_corrupted: usize,
    pub fields_fixed: usize,
    pub rows_fixed: usize,
}

impl TableReport {
    pub fn new(table: &str, status: TableStatus) -> Self {
        Self {
            table: table.to_string(),
            status,
            rows_scanned: 0,
            fields_examined: 0,
            fields_corrupted: 0,
            fields_fixed: 0,
            rows_fixed: 0,
        }
    }
}

/// A failure that skipped a row, column or table without aborting the scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoftFailure {
    pub table: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RowId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    pub message: String,
}

impl SoftFailure {
    pub fn table(table: &str, message: impl Into<String>) -> Self {
        Self {
            table: table.to_string(),
            id: None,
            column: None,
            message: message.into(),
        }
    }

    pub fn column(table: &str, column: &str, message: impl Into<String>) -> Self {
        Self {
            column: Some(column.to_string()),
            ..Self::table(table, message)
        }
    }

    pub fn row(table: &str, id: RowId, message: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            ..Self::table(table, message)
        }
    }
}

// =============================================================================
// CHECK
// =============================================================================

/// A corrupted field and what repair would turn it into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorruptionSample {
    pub table: String,
    pub id: RowId,
    pub column: String,
    pub original: String,
    pub fixed: String,
    pub signatures: Vec<CorruptionSignature>,
}

/// Result of a read-only corruption check across tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorruptionReport {
    /// True when at least one corrupted field was found.
    pub corrupted: bool,
    pub total_corrupted: usize,
    pub tables: Vec<TableReport>,
    /// Capped at [`defaults::CHECK_SAMPLE_LIMIT`].
    pub samples: Vec<CorruptionSample>,
    pub failures: Vec<SoftFailure>,
    pub checked_at: DateTime<Utc>,
}

// =============================================================================
// FIX
// =============================================================================

/// One field rewritten by a repair pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    pub table: String,
    pub id: RowId,
    pub field: String,
    pub before: String,
    pub after: String,
}

/// Result of a repair pass across tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixResult {
    pub total_records_fixed: usize,
    pub total_fields_fixed: usize,
    pub tables: Vec<TableReport>,
    /// Capped at [`defaults::FIX_CHANGE_LIMIT`].
    pub changes: Vec<FieldChange>,
    pub total_changes: usize,
    pub errors: Vec<SoftFailure>,
    pub fixed_at: DateTime<Utc>,
}

// =============================================================================
// DIAGNOSE
// =============================================================================

/// A character and its code point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharCode {
    #[serde(rename = "char")]
    pub ch: char,
    pub code: u32,
    pub hex: String,
}

impl CharCode {
    pub fn of(text: &str) -> Vec<CharCode> {
        text.chars()
            .map(|ch| CharCode {
                ch,
                code: ch as u32,
                hex: format!("{:x}", ch as u32),
            })
            .collect()
    }
}

/// A suspicious field with its code points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosedField {
    pub id: RowId,
    pub column: String,
    pub value: String,
    pub char_codes: Vec<CharCode>,
    pub signatures: Vec<CorruptionSignature>,
    pub has_non_ascii: bool,
}

/// Bounded sample of one table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableDiagnosis {
    pub table: String,
    pub status: TableStatus,
    pub rows_sampled: usize,
    /// Capped at [`defaults::DIAGNOSE_SAMPLES_PER_TABLE`].
    pub samples: Vec<DiagnosedField>,
}

/// Result of a read-only diagnosis across tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosisReport {
    pub tables: Vec<TableDiagnosis>,
    pub tables_with_corruption: usize,
    pub failures: Vec<SoftFailure>,
    pub diagnosed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_schema_defaults_id_column() {
        let schema: TableSchema =
            serde_json::from_str(r#"{"name":"clients","columns":["name"]}"#).unwrap();
        assert_eq!(schema.id_column, "id");
        assert_eq!(schema, TableSchema::new("clients", &["name"]));
    }

    #[test]
    fn test_row_id_serializes_untagged() {
        assert_eq!(serde_json::to_string(&RowId::Integer(7)).unwrap(), "7");
        assert_eq!(
            serde_json::to_string(&RowId::Text("u-1".into())).unwrap(),
            "\"u-1\""
        );
        assert_eq!(RowId::Integer(42).to_string(), "42");
    }

    #[test]
    fn test_table_status_snake_case() {
        let json = serde_json::to_string(&TableStatus::NotFound).unwrap();
        assert_eq!(json, "\"not_found\"");
    }

    #[test]
    fn test_soft_failure_skips_empty_fields() {
        let failure = SoftFailure::row("users", RowId::Integer(3), "constraint failed");
        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(json["id"], 3);
        assert!(json.get("column").is_none());
    }

    #[test]
    fn test_char_codes() {
        let codes = CharCode::of("ção");
        assert_eq!(codes.len(), 3);
        assert_eq!(codes[0].code, 0xe7);
        assert_eq!(codes[0].hex, "e7");
        let json = serde_json::to_value(&codes[1]).unwrap();
        assert_eq!(json["char"], "ã");
    }
}
