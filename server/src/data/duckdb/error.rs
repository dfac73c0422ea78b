//! DuckDB error types

use thiserror::Error;

use crate::table::TableError;

#[derive(Error, Debug)]
pub enum DuckdbError {
    #[error("Database error: {0}")]
    Database(#[from] duckdb::Error),

    #[error("Migration {version} ({name}) failed: {error}")]
    MigrationFailed {
        version: i32,
        name: String,
        error: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Query timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("DuckDB connection is closed")]
    Closed,

    #[error(transparent)]
    Table(#[from] TableError),
}

impl From<DuckdbError> for TableError {
    fn from(e: DuckdbError) -> Self {
        match e {
            DuckdbError::Table(inner) => inner,
            other => TableError::source(other),
        }
    }
}
