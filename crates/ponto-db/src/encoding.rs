//! Table scan-and-repair driver for corrupted text columns.
//!
//! One invocation acquires a single pooled connection and visits each
//! configured table in order:
//!
//! 1. confirm the table exists (`sqlite_master`), otherwise `not_found`;
//! 2. confirm the identifier and text columns exist (`pragma_table_info`),
//!    skipping missing ones with a soft failure;
//! 3. read every row (check, repair) or a bounded sample (diagnose);
//! 4. run the detector on each text field;
//! 5. in repair mode, write back only the columns whose value changed.
//!
//! Failures below the connection level never abort the invocation. They
//! are collected as [`SoftFailure`]s and the scan moves on.

use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnection, SqlitePool, SqliteRow};
use sqlx::Row;
use tracing::{debug, info, trace, warn};

use ponto_core::encoding::Normalizer;
use ponto_core::logging::{components, subsystems};
use ponto_core::{
    defaults, CharCode, CorruptionReport, CorruptionSample, DiagnosedField, DiagnosisReport,
    EncodingRepository, Error, FieldChange, FixResult, Result, RowId, SoftFailure, TableDiagnosis,
    TableReport, TableSchema, TableStatus,
};

use crate::pool::log_pool_metrics;
use crate::schema_validation::quote_identifier;

/// What a table scan does with the rows it reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Read all rows and report corrupted fields.
    Check,
    /// Read at most `limit` rows and describe suspicious fields.
    Diagnose { limit: i64 },
    /// Read all rows and write repaired values back.
    Repair,
}

impl ScanMode {
    fn as_str(&self) -> &'static str {
        match self {
            ScanMode::Check => "check",
            ScanMode::Diagnose { .. } => "diagnose",
            ScanMode::Repair => "fix",
        }
    }
}

/// Everything one table contributed to an invocation.
#[derive(Debug, Clone)]
pub struct TableScan {
    pub report: TableReport,
    /// Check mode; capped at [`defaults::CHECK_SAMPLE_LIMIT`].
    pub samples: Vec<CorruptionSample>,
    /// Diagnose mode; capped at [`defaults::DIAGNOSE_SAMPLES_PER_TABLE`].
    pub diagnosed: Vec<DiagnosedField>,
    /// Repair mode; capped at [`defaults::FIX_CHANGE_LIMIT`].
    pub changes: Vec<FieldChange>,
    pub failures: Vec<SoftFailure>,
}

impl TableScan {
    fn new(table: &str, status: TableStatus) -> Self {
        Self {
            report: TableReport::new(table, status),
            samples: Vec::new(),
            diagnosed: Vec::new(),
            changes: Vec::new(),
            failures: Vec::new(),
        }
    }

    fn failed(table: &str, failure: SoftFailure) -> Self {
        let mut scan = Self::new(table, TableStatus::Failed);
        scan.failures.push(failure);
        scan
    }
}

/// Build the `SELECT` for a scan. The identifier column is always first.
pub fn select_sql(
    table: &str,
    id_column: &str,
    columns: &[&str],
    limited: bool,
) -> Result<String> {
    let mut projected = vec![quote_identifier(id_column)?];
    for column in columns {
        projected.push(quote_identifier(column)?);
    }
    let mut sql = format!(
        "SELECT {} FROM {}",
        projected.join(", "),
        quote_identifier(table)?
    );
    if limited {
        sql.push_str(" LIMIT ?");
    }
    Ok(sql)
}

/// Build a partial `UPDATE` setting only `changed` columns, keyed by `id_column`.
pub fn update_sql(table: &str, id_column: &str, changed: &[&str]) -> Result<String> {
    if changed.is_empty() {
        return Err(Error::InvalidInput(
            "update requires at least one changed column".to_string(),
        ));
    }
    let assignments = changed
        .iter()
        .map(|column| Ok(format!("{} = ?", quote_identifier(column)?)))
        .collect::<Result<Vec<_>>>()?;
    Ok(format!(
        "UPDATE {} SET {} WHERE {} = ?",
        quote_identifier(table)?,
        assignments.join(", "),
        quote_identifier(id_column)?
    ))
}

async fn table_exists(conn: &mut SqliteConnection, table: &str) -> Result<bool> {
    let found: Option<String> =
        sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?")
            .bind(table)
            .fetch_optional(&mut *conn)
            .await
            .map_err(Error::Database)?;
    Ok(found.is_some())
}

async fn table_columns(conn: &mut SqliteConnection, table: &str) -> Result<Vec<String>> {
    sqlx::query_scalar("SELECT name FROM pragma_table_info(?)")
        .bind(table)
        .fetch_all(&mut *conn)
        .await
        .map_err(Error::Database)
}

fn row_id(row: &SqliteRow) -> std::result::Result<RowId, sqlx::Error> {
    match row.try_get::<i64, _>(0) {
        Ok(id) => Ok(RowId::Integer(id)),
        Err(_) => row.try_get::<String, _>(0).map(RowId::Text),
    }
}

/// Text value of a column, `None` for NULL or non-text values.
fn text_value(row: &SqliteRow, index: usize) -> Option<String> {
    row.try_get::<Option<String>, _>(index).ok().flatten()
}

/// Scan one table on an already-acquired connection.
pub async fn scan_table(
    conn: &mut SqliteConnection,
    normalizer: &Normalizer,
    schema: &TableSchema,
    mode: ScanMode,
) -> TableScan {
    let table = schema.name.as_str();

    if let Err(e) = quote_identifier(table) {
        warn!(
            subsystem = subsystems::DATABASE,
            component = components::SCANNER,
            db_table = table,
            error = %e,
            "Skipping table with invalid name"
        );
        return TableScan::failed(table, SoftFailure::table(table, e.to_string()));
    }

    match table_exists(conn, table).await {
        Ok(true) => {}
        Ok(false) => {
            debug!(
                subsystem = subsystems::DATABASE,
                component = components::SCANNER,
                db_table = table,
                "Table not found, skipping"
            );
            return TableScan::new(table, TableStatus::NotFound);
        }
        Err(e) => {
            warn!(subsystem = subsystems::DATABASE, component = components::SCANNER, db_table = table, error = %e, "Table lookup failed");
            return TableScan::failed(table, SoftFailure::table(table, e.to_string()));
        }
    }

    let present = match table_columns(conn, table).await {
        Ok(columns) => columns,
        Err(e) => {
            warn!(subsystem = subsystems::DATABASE, component = components::SCANNER, db_table = table, error = %e, "Column lookup failed");
            return TableScan::failed(table, SoftFailure::table(table, e.to_string()));
        }
    };

    let mut scan = TableScan::new(table, TableStatus::Checked);

    if !present.iter().any(|c| c == &schema.id_column) {
        warn!(
            subsystem = subsystems::DATABASE,
            component = components::SCANNER,
            db_table = table,
            db_column = %schema.id_column,
            "Identifier column missing, table skipped"
        );
        scan.report.status = TableStatus::Failed;
        scan.failures.push(SoftFailure::column(
            table,
            &schema.id_column,
            "identifier column does not exist",
        ));
        return scan;
    }

    let mut columns: Vec<&str> = Vec::with_capacity(schema.columns.len());
    for column in &schema.columns {
        if let Err(e) = quote_identifier(column) {
            scan.failures
                .push(SoftFailure::column(table, column, e.to_string()));
        } else if !present.iter().any(|c| c == column) {
            warn!(
                subsystem = subsystems::DATABASE,
                component = components::SCANNER,
                db_table = table,
                db_column = %column,
                "Configured column missing, skipped"
            );
            scan.failures
                .push(SoftFailure::column(table, column, "column does not exist"));
        } else {
            columns.push(column.as_str());
        }
    }
    if columns.is_empty() {
        return scan;
    }

    let rows = match read_rows(conn, schema, &columns, mode).await {
        Ok(rows) => rows,
        Err(e) => {
            warn!(subsystem = subsystems::DATABASE, component = components::SCANNER, db_table = table, error = %e, "Table read failed");
            scan.report.status = TableStatus::Failed;
            scan.failures.push(SoftFailure::table(table, e.to_string()));
            return scan;
        }
    };

    for row in &rows {
        scan.report.rows_scanned += 1;
        let id = match row_id(row) {
            Ok(id) => id,
            Err(e) => {
                scan.failures.push(SoftFailure::table(
                    table,
                    format!("unreadable identifier: {}", e),
                ));
                continue;
            }
        };

        let mut repaired: Vec<(&str, String, String)> = Vec::new();
        for (offset, column) in columns.iter().copied().enumerate() {
            let Some(value) = text_value(row, offset + 1) else {
                continue;
            };
            scan.report.fields_examined += 1;
            let signatures = normalizer.signatures(&value);

            if let ScanMode::Diagnose { .. } = mode {
                let has_non_ascii = !value.is_ascii();
                if !signatures.is_empty() {
                    scan.report.fields_corrupted += 1;
                }
                if (has_non_ascii || !signatures.is_empty())
                    && scan.diagnosed.len() < defaults::DIAGNOSE_SAMPLES_PER_TABLE
                {
                    scan.diagnosed.push(DiagnosedField {
                        id: id.clone(),
                        column: column.to_string(),
                        char_codes: CharCode::of(&value),
                        value,
                        signatures,
                        has_non_ascii,
                    });
                }
                continue;
            }

            if signatures.is_empty() {
                continue;
            }
            scan.report.fields_corrupted += 1;
            let fixed = normalizer.repair(&value).into_owned();
            trace!(
                subsystem = subsystems::DATABASE,
                component = components::SCANNER,
                db_table = table,
                db_column = %column,
                row_id = %id,
                changed = fixed != value,
                "Corrupted field"
            );

            match mode {
                ScanMode::Check => {
                    if scan.samples.len() < defaults::CHECK_SAMPLE_LIMIT {
                        scan.samples.push(CorruptionSample {
                            table: table.to_string(),
                            id: id.clone(),
                            column: column.to_string(),
                            original: value,
                            fixed,
                            signatures,
                        });
                    }
                }
                ScanMode::Repair if fixed != value => repaired.push((column, value, fixed)),
                _ => {}
            }
        }

        if !repaired.is_empty() {
            match write_back(conn, schema, &id, &repaired).await {
                Ok(()) => {
                    scan.report.rows_fixed += 1;
                    scan.report.fields_fixed += repaired.len();
                    for (column, before, after) in repaired {
                        if scan.changes.len() < defaults::FIX_CHANGE_LIMIT {
                            scan.changes.push(FieldChange {
                                table: table.to_string(),
                                id: id.clone(),
                                field: column.to_string(),
                                before,
                                after,
                            });
                        }
                    }
                }
                Err(e) => {
                    warn!(
                        subsystem = subsystems::DATABASE,
                        component = components::SCANNER,
                        db_table = table,
                        row_id = %id,
                        error = %e,
                        "Row update failed"
                    );
                    scan.failures.push(SoftFailure::row(table, id, e.to_string()));
                }
            }
        }
    }

    debug!(
        subsystem = subsystems::DATABASE,
        component = components::SCANNER,
        op = mode.as_str(),
        db_table = table,
        row_count = scan.report.rows_scanned,
        fields_examined = scan.report.fields_examined,
        fields_corrupted = scan.report.fields_corrupted,
        fields_fixed = scan.report.fields_fixed,
        "Table scanned"
    );
    scan
}

async fn read_rows(
    conn: &mut SqliteConnection,
    schema: &TableSchema,
    columns: &[&str],
    mode: ScanMode,
) -> Result<Vec<SqliteRow>> {
    let limit = match mode {
        ScanMode::Diagnose { limit } => Some(limit),
        _ => None,
    };
    let sql = select_sql(&schema.name, &schema.id_column, columns, limit.is_some())?;
    let mut query = sqlx::query(&sql);
    if let Some(limit) = limit {
        query = query.bind(limit);
    }
    query.fetch_all(&mut *conn).await.map_err(Error::Database)
}

async fn write_back(
    conn: &mut SqliteConnection,
    schema: &TableSchema,
    id: &RowId,
    repaired: &[(&str, String, String)],
) -> Result<()> {
    let changed: Vec<&str> = repaired.iter().map(|(column, _, _)| *column).collect();
    let sql = update_sql(&schema.name, &schema.id_column, &changed)?;

    let mut query = sqlx::query(&sql);
    for (_, _, after) in repaired {
        query = query.bind(after.as_str());
    }
    query = match id {
        RowId::Integer(id) => query.bind(*id),
        RowId::Text(id) => query.bind(id.as_str()),
    };

    let result = query.execute(&mut *conn).await.map_err(Error::Database)?;
    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!(
            "row {} disappeared from {}",
            id, schema.name
        )));
    }
    Ok(())
}

/// SQLite implementation of [`EncodingRepository`].
#[derive(Clone)]
pub struct SqliteEncodingRepository {
    pool: SqlitePool,
    normalizer: Normalizer,
}

impl SqliteEncodingRepository {
    /// Repository using the default Portuguese pattern table.
    pub fn new(pool: SqlitePool) -> Self {
        Self::with_normalizer(pool, Normalizer::default())
    }

    pub fn with_normalizer(pool: SqlitePool, normalizer: Normalizer) -> Self {
        Self { pool, normalizer }
    }

    /// Run `mode` over every table on one pooled connection.
    async fn scan_all(&self, tables: &[TableSchema], mode: ScanMode) -> Result<Vec<TableScan>> {
        let mut conn = self.pool.acquire().await.map_err(|e| {
            warn!(
                subsystem = subsystems::DATABASE,
                component = components::SCANNER,
                op = mode.as_str(),
                error = %e,
                "Could not acquire connection"
            );
            Error::Database(e)
        })?;
        log_pool_metrics(&self.pool);

        let mut scans = Vec::with_capacity(tables.len());
        for schema in tables {
            scans.push(scan_table(&mut *conn, &self.normalizer, schema, mode).await);
        }
        Ok(scans)
    }
}

#[async_trait]
impl EncodingRepository for SqliteEncodingRepository {
    async fn check_corruption(&self, tables: &[TableSchema]) -> Result<CorruptionReport> {
        let start = Instant::now();
        let scans = self.scan_all(tables, ScanMode::Check).await?;

        let mut report = CorruptionReport {
            corrupted: false,
            total_corrupted: 0,
            tables: Vec::with_capacity(scans.len()),
            samples: Vec::new(),
            failures: Vec::new(),
            checked_at: Utc::now(),
        };
        for scan in scans {
            report.total_corrupted += scan.report.fields_corrupted;
            let room = defaults::CHECK_SAMPLE_LIMIT.saturating_sub(report.samples.len());
            report.samples.extend(scan.samples.into_iter().take(room));
            report.failures.extend(scan.failures);
            report.tables.push(scan.report);
        }
        report.corrupted = report.total_corrupted > 0;

        info!(
            subsystem = subsystems::DATABASE,
            component = components::SCANNER,
            op = "check",
            fields_corrupted = report.total_corrupted,
            soft_failures = report.failures.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Encoding check complete"
        );
        Ok(report)
    }

    async fn diagnose_corruption(
        &self,
        tables: &[TableSchema],
        row_limit: i64,
    ) -> Result<DiagnosisReport> {
        let start = Instant::now();
        let limit = row_limit.max(0);
        let scans = self
            .scan_all(tables, ScanMode::Diagnose { limit })
            .await?;

        let mut report = DiagnosisReport {
            tables: Vec::with_capacity(scans.len()),
            tables_with_corruption: 0,
            failures: Vec::new(),
            diagnosed_at: Utc::now(),
        };
        for scan in scans {
            if scan.report.fields_corrupted > 0 {
                report.tables_with_corruption += 1;
            }
            report.failures.extend(scan.failures);
            report.tables.push(TableDiagnosis {
                table: scan.report.table,
                status: scan.report.status,
                rows_sampled: scan.report.rows_scanned,
                samples: scan.diagnosed,
            });
        }

        info!(
            subsystem = subsystems::DATABASE,
            component = components::SCANNER,
            op = "diagnose",
            tables_with_corruption = report.tables_with_corruption,
            duration_ms = start.elapsed().as_millis() as u64,
            "Encoding diagnosis complete"
        );
        Ok(report)
    }

    async fn fix_encoding(&self, tables: &[TableSchema]) -> Result<FixResult> {
        let start = Instant::now();
        let scans = self.scan_all(tables, ScanMode::Repair).await?;

        let mut result = FixResult {
            total_records_fixed: 0,
            total_fields_fixed: 0,
            tables: Vec::with_capacity(scans.len()),
            changes: Vec::new(),
            total_changes: 0,
            errors: Vec::new(),
            fixed_at: Utc::now(),
        };
        for scan in scans {
            result.total_records_fixed += scan.report.rows_fixed;
            result.total_fields_fixed += scan.report.fields_fixed;
            let room = defaults::FIX_CHANGE_LIMIT.saturating_sub(result.changes.len());
            result.changes.extend(scan.changes.into_iter().take(room));
            result.errors.extend(scan.failures);
            result.tables.push(scan.report);
        }
        result.total_changes = result.total_fields_fixed;

        info!(
            subsystem = subsystems::DATABASE,
            component = components::SCANNER,
            op = "fix",
            row_count = result.total_records_fixed,
            fields_fixed = result.total_fields_fixed,
            soft_failures = result.errors.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Encoding repair complete"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_sql_quotes_identifiers() {
        let sql = select_sql("groups", "id", &["name", "description"], false).unwrap();
        assert_eq!(sql, r#"SELECT "id", "name", "description" FROM "groups""#);
    }

    #[test]
    fn test_select_sql_with_limit() {
        let sql = select_sql("users", "id", &["email"], true).unwrap();
        assert!(sql.ends_with(" LIMIT ?"));
    }

    #[test]
    fn test_update_sql_contains_only_changed_columns() {
        let sql = update_sql("users", "id", &["last_name"]).unwrap();
        assert_eq!(sql, r#"UPDATE "users" SET "last_name" = ? WHERE "id" = ?"#);
        assert!(!sql.contains("first_name"));
    }

    #[test]
    fn test_update_sql_custom_id_column() {
        let sql = update_sql("utilizadores", "user_id", &["nome", "email"]).unwrap();
        assert_eq!(
            sql,
            r#"UPDATE "utilizadores" SET "nome" = ?, "email" = ? WHERE "user_id" = ?"#
        );
    }

    #[test]
    fn test_update_sql_rejects_empty_and_unsafe() {
        assert!(update_sql("users", "id", &[]).is_err());
        assert!(update_sql("users", "id", &["name = 'x' --"]).is_err());
        assert!(select_sql("users;", "id", &["name"], false).is_err());
    }
}
