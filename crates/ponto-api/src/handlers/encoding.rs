//! Encoding admin HTTP handlers.
//!
//! Check and diagnose are read-only. Fix writes repaired values back and is
//! safe to repeat: a second run finds nothing to change.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use ponto_core::logging::subsystems;
use ponto_core::{
    defaults, CorruptionReport, CorruptionSignature, DiagnosisReport, EncodingRepository,
    FixResult, TableSchema,
};

use crate::{ApiError, ApiSuccess, AppState};

/// Upper bound for `?limit=` on the diagnose route.
const MAX_DIAGNOSE_LIMIT: i64 = 1000;

/// Query parameters shared by check and fix.
#[derive(Debug, Default, Deserialize)]
pub struct TablesQuery {
    /// Comma-separated table names restricting the configured set.
    pub tables: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DiagnoseQuery {
    pub tables: Option<String>,
    /// Rows sampled per table (default 50).
    pub limit: Option<i64>,
}

/// Resolve the `tables` parameter against the configured schemas.
fn selected_tables(state: &AppState, tables: Option<&str>) -> Result<Vec<TableSchema>, ApiError> {
    let names: Vec<&str> = tables
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .collect();
    if names.is_empty() {
        return Ok(state.config.tables.clone());
    }
    Ok(state.config.restrict(&names)?)
}

/// Report corrupted fields across the configured tables without writing.
///
/// # Returns
/// - 200 OK with the corruption report
/// - 400 Bad Request if `tables` names an unconfigured table
/// - 500 Internal Server Error if no connection could be acquired
pub async fn check_encoding(
    State(state): State<AppState>,
    Query(query): Query<TablesQuery>,
) -> Result<Json<ApiSuccess<CorruptionReport>>, ApiError> {
    let tables = selected_tables(&state, query.tables.as_deref())?;
    let report = state.db.encoding.check_corruption(&tables).await?;
    Ok(ApiSuccess::new(report))
}

/// Sample each table and show code points of suspicious fields.
pub async fn diagnose_encoding(
    State(state): State<AppState>,
    Query(query): Query<DiagnoseQuery>,
) -> Result<Json<ApiSuccess<DiagnosisReport>>, ApiError> {
    let limit = query.limit.unwrap_or(defaults::DIAGNOSE_ROW_LIMIT);
    if !(1..=MAX_DIAGNOSE_LIMIT).contains(&limit) {
        return Err(ApiError::BadRequest(format!(
            "limit must be between 1 and {}",
            MAX_DIAGNOSE_LIMIT
        )));
    }
    let tables = selected_tables(&state, query.tables.as_deref())?;
    let report = state.db.encoding.diagnose_corruption(&tables, limit).await?;
    Ok(ApiSuccess::new(report))
}

/// Repair corrupted fields and write changed columns back.
///
/// # Returns
/// - 200 OK with rows fixed, fields fixed and up to 50 changes
/// - 400 Bad Request if `tables` names an unconfigured table
/// - 500 Internal Server Error if no connection could be acquired
pub async fn fix_encoding(
    State(state): State<AppState>,
    Query(query): Query<TablesQuery>,
) -> Result<Json<ApiSuccess<FixResult>>, ApiError> {
    let tables = selected_tables(&state, query.tables.as_deref())?;
    info!(
        subsystem = subsystems::API,
        op = "fix",
        tables = tables.len(),
        "Encoding repair requested"
    );
    let result = state.db.encoding.fix_encoding(&tables).await?;
    Ok(ApiSuccess::new(result))
}

#[derive(Debug, Deserialize)]
pub struct FixTextRequest {
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FixTextResponse {
    pub original: String,
    pub fixed: String,
    pub corrupted: bool,
    pub changed: bool,
    pub signatures: Vec<CorruptionSignature>,
}

/// Repair a single value without touching the store.
pub async fn fix_text(
    State(state): State<AppState>,
    Json(body): Json<FixTextRequest>,
) -> Result<Json<ApiSuccess<FixTextResponse>>, ApiError> {
    let original = body
        .text
        .ok_or_else(|| ApiError::BadRequest("text is required".to_string()))?;
    let signatures = state.normalizer.signatures(&original);
    let fixed = state.normalizer.repair(&original).into_owned();
    Ok(ApiSuccess::new(FixTextResponse {
        corrupted: !signatures.is_empty(),
        changed: fixed != original,
        original,
        fixed,
        signatures,
    }))
}
