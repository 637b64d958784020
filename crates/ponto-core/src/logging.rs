//! Structured logging schema and field name constants for ponto.
//!
//! Field names in `tracing` macros are identifiers and are written inline;
//! they must match the name constants below. Field *values* that classify
//! an event (`subsystem`, `component`) are taken from [`subsystems`] and
//! [`components`] so every crate emits the same vocabulary.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Soft failure, the scan continued without the row/table |
//! | INFO  | Lifecycle events (startup, shutdown), operation completions |
//! | DEBUG | Decision points, per-table results, config choices |
//! | TRACE | Per-field iteration (detections, repairs) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID propagated across a request.
/// Format: UUIDv7 (time-ordered).
pub const REQUEST_ID: &str = "request_id";

/// Subsystem originating the log event. Values: see [`subsystems`].
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem. Values: see [`components`].
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "check", "diagnose", "fix", "fix_text"
pub const OPERATION: &str = "op";

/// Values of the [`SUBSYSTEM`] field.
pub mod subsystems {
    pub const API: &str = "api";
    pub const CONFIG: &str = "config";
    pub const DATABASE: &str = "database";
    pub const ENCODING: &str = "encoding";
}

/// Values of the [`COMPONENT`] field.
pub mod components {
    /// Connection pool lifecycle and metrics.
    pub const POOL: &str = "pool";
    /// Table scan-and-repair driver.
    pub const SCANNER: &str = "scanner";
    /// Pattern table construction.
    pub const PATTERNS: &str = "patterns";
}

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Database table being scanned.
pub const DB_TABLE: &str = "db_table";

/// Column of the field being examined.
pub const DB_COLUMN: &str = "db_column";

/// Row identifier of the field being examined.
pub const ROW_ID: &str = "row_id";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of rows read from a table.
pub const ROW_COUNT: &str = "row_count";

/// Number of fields run through the detector.
pub const FIELDS_EXAMINED: &str = "fields_examined";

/// Number of fields flagged as corrupted.
pub const FIELDS_CORRUPTED: &str = "fields_corrupted";

/// Number of fields written back.
pub const FIELDS_FIXED: &str = "fields_fixed";

// ─── Database fields ───────────────────────────────────────────────────────

/// Number of active connections in the pool.
pub const POOL_SIZE: &str = "pool_size";

/// Number of idle connections in the pool.
pub const POOL_IDLE: &str = "pool_idle";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_values_are_distinct() {
        let subsystems = [
            subsystems::API,
            subsystems::CONFIG,
            subsystems::DATABASE,
            subsystems::ENCODING,
        ];
        let components = [components::POOL, components::SCANNER, components::PATTERNS];
        for values in [&subsystems[..], &components[..]] {
            let mut sorted = values.to_vec();
            sorted.sort_unstable();
            sorted.dedup();
            assert_eq!(sorted.len(), values.len());
            assert!(values.iter().all(|v| v.chars().all(|c| c.is_ascii_lowercase())));
        }
        assert_ne!(SUBSYSTEM, COMPONENT);
    }
}
