//! Test fixtures for database integration tests.
//!
//! Each [`TestDatabase`] owns a fresh SQLite file inside a temporary
//! directory that is removed when the fixture is dropped. The default
//! timesheet tables are created empty; [`TestDatabase::insert`] seeds rows.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ponto_db::test_fixtures::TestDatabase;
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let test_db = TestDatabase::new().await;
//!     let id = test_db
//!         .insert("users", &[("first_name", "Jo??o"), ("last_name", "Silva")])
//!         .await;
//!
//!     // Run your tests against test_db.db ...
//! }
//! ```

use std::path::PathBuf;

use sqlx::sqlite::SqliteConnectOptions;
use sqlx::SqlitePool;
use tempfile::TempDir;

use crate::pool::{create_pool_with_options, PoolConfig};
use crate::schema_validation::quote_identifier;
use crate::Database;

/// DDL for the default timesheet tables.
pub const TIMESHEET_SCHEMA: &[&str] = &[
    r#"CREATE TABLE "users" (
        "id" INTEGER PRIMARY KEY AUTOINCREMENT,
        "first_name" TEXT,
        "last_name" TEXT,
        "email" TEXT,
        "role" TEXT,
        "hourly_rate" REAL
    )"#,
    r#"CREATE TABLE "clients" (
        "id" INTEGER PRIMARY KEY AUTOINCREMENT,
        "name" TEXT NOT NULL,
        "description" TEXT
    )"#,
    r#"CREATE TABLE "projects" (
        "id" INTEGER PRIMARY KEY AUTOINCREMENT,
        "client_id" INTEGER,
        "name" TEXT NOT NULL,
        "description" TEXT
    )"#,
    r#"CREATE TABLE "time_entries" (
        "id" INTEGER PRIMARY KEY AUTOINCREMENT,
        "user_id" INTEGER,
        "project_id" INTEGER,
        "description" TEXT,
        "notes" TEXT,
        "hours" REAL
    )"#,
    r#"CREATE TABLE "groups" (
        "id" INTEGER PRIMARY KEY AUTOINCREMENT,
        "name" TEXT NOT NULL,
        "description" TEXT
    )"#,
    r#"CREATE TABLE "categories" (
        "id" INTEGER PRIMARY KEY AUTOINCREMENT,
        "name" TEXT NOT NULL,
        "description" TEXT
    )"#,
];

/// Temporary SQLite database, deleted on drop.
pub struct TestDatabase {
    pub pool: SqlitePool,
    pub db: Database,
    pub path: PathBuf,
    _dir: TempDir,
}

impl TestDatabase {
    /// Fresh database with the default timesheet tables, all empty.
    pub async fn new() -> Self {
        let test_db = Self::empty().await;
        for ddl in TIMESHEET_SCHEMA {
            test_db.execute(ddl).await;
        }
        test_db
    }

    /// Fresh database with no tables.
    pub async fn empty() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temporary directory");
        let path = dir.path().join("ponto_test.db");

        let config = PoolConfig::new()
            .max_connections(2)
            .min_connections(0)
            .create_if_missing(true);
        let options = SqliteConnectOptions::new().filename(&path);
        let pool = create_pool_with_options(options, config)
            .await
            .expect("Failed to create test database pool");

        Self {
            db: Database::new(pool.clone()),
            pool,
            path,
            _dir: dir,
        }
    }

    /// URL other pools (for example a test server) can connect to.
    pub fn url(&self) -> String {
        format!("sqlite://{}", self.path.display())
    }

    /// Execute a statement without parameters.
    pub async fn execute(&self, sql: &str) {
        sqlx::query(sql)
            .execute(&self.pool)
            .await
            .unwrap_or_else(|e| panic!("Failed to execute {}: {}", sql, e));
    }

    /// Insert a row of text values and return its rowid.
    pub async fn insert(&self, table: &str, values: &[(&str, &str)]) -> i64 {
        let columns = values
            .iter()
            .map(|(column, _)| quote_identifier(column).expect("invalid column name"))
            .collect::<Vec<_>>();
        let placeholders = vec!["?"; values.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_identifier(table).expect("invalid table name"),
            columns.join(", "),
            placeholders
        );

        let mut query = sqlx::query(&sql);
        for (_, value) in values {
            query = query.bind(*value);
        }
        query
            .execute(&self.pool)
            .await
            .expect("Failed to insert test row")
            .last_insert_rowid()
    }

    /// Read one text column of one row by integer id.
    pub async fn fetch_text(&self, table: &str, id: i64, column: &str) -> Option<String> {
        let sql = format!(
            "SELECT {} FROM {} WHERE \"id\" = ?",
            quote_identifier(column).expect("invalid column name"),
            quote_identifier(table).expect("invalid table name"),
        );
        sqlx::query_scalar(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .expect("Failed to fetch test row")
    }
}
