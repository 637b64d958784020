//! Centralized default constants for ponto.
//!
//! **This module is the single source of truth** for shared default values.
//! Crates reference these constants instead of defining their own magic
//! numbers.

// =============================================================================
// ENCODING REPORTS
// =============================================================================

/// Maximum corrupted-field samples returned by a corruption check.
pub const CHECK_SAMPLE_LIMIT: usize = 50;

/// Maximum field-level changes returned by a repair pass.
pub const FIX_CHANGE_LIMIT: usize = 50;

/// Rows read per table by the read-only diagnosis.
pub const DIAGNOSE_ROW_LIMIT: i64 = 50;

/// Suspicious fields reported per table by the diagnosis.
pub const DIAGNOSE_SAMPLES_PER_TABLE: usize = 10;

// =============================================================================
// SCHEMA
// =============================================================================

/// Identifier column used when a table schema does not name one.
pub const ID_COLUMN: &str = "id";

/// Longest identifier accepted for table and column names.
pub const MAX_IDENTIFIER_LEN: usize = 63;

// =============================================================================
// SERVER
// =============================================================================

/// Default HTTP server port.
pub const SERVER_PORT: u16 = 4000;

/// Default bind address.
pub const SERVER_HOST: &str = "0.0.0.0";

/// Default database URL (SQLite file next to the server).
pub const DATABASE_URL: &str = "sqlite://timetracker.db";

/// Default maximum number of pooled database connections.
pub const DB_MAX_CONNECTIONS: u32 = 5;
