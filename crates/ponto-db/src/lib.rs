//! # ponto-db
//!
//! SQLite layer for ponto.
//!
//! This crate provides:
//! - Connection pool management
//! - Identifier validation for configured table and column names
//! - The table scan-and-repair driver behind [`EncodingRepository`]
//!
//! ## Example
//!
//! ```rust,ignore
//! use ponto_db::{Database, EncodingConfig, EncodingRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("sqlite://timetracker.db").await?;
//!     let config = EncodingConfig::default();
//!
//!     let report = db.encoding.check_corruption(&config.tables).await?;
//!     println!("{} corrupted fields", report.total_corrupted);
//!     Ok(())
//! }
//! ```

pub mod encoding;
pub mod pool;
pub mod schema_validation;

// Test fixtures for integration tests
// Note: Always compiled so integration tests in other crates can seed a store
pub mod test_fixtures;

// Re-export core types
pub use ponto_core::*;

pub use encoding::{scan_table, select_sql, update_sql, ScanMode, SqliteEncodingRepository, TableScan};
pub use pool::{
    create_pool, create_pool_with_config, create_pool_with_options, log_pool_metrics, PoolConfig,
};
pub use schema_validation::{quote_identifier, validate_identifier};

use ponto_core::encoding::Normalizer;
use sqlx::SqlitePool;

/// Database context holding the pool and the encoding repository.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: SqlitePool,
    /// Scan-and-repair operations over configured tables.
    pub encoding: SqliteEncodingRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            encoding: SqliteEncodingRepository::new(pool.clone()),
            pool,
        }
    }

    /// Replace the normalizer used by the encoding repository.
    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.encoding = SqliteEncodingRepository::with_normalizer(self.pool.clone(), normalizer);
        self
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
