//! Core traits for ponto abstractions.
//!
//! Concrete stores implement these so the API layer can be exercised
//! against any backend.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::*;

/// Scans configured tables for corrupted text and repairs it in place.
///
/// Table-level and row-level problems are reported inside the returned
/// value as soft failures. An `Err` means the invocation itself failed,
/// for example because no connection could be acquired.
#[async_trait]
pub trait EncodingRepository: Send + Sync {
    /// Read every row of every table and report corrupted fields.
    async fn check_corruption(&self, tables: &[TableSchema]) -> Result<CorruptionReport>;

    /// Read at most `row_limit` rows per table and describe suspicious fields.
    async fn diagnose_corruption(
        &self,
        tables: &[TableSchema],
        row_limit: i64,
    ) -> Result<DiagnosisReport>;

    /// Repair corrupted fields and write changed columns back.
    async fn fix_encoding(&self, tables: &[TableSchema]) -> Result<FixResult>;
}
