//! Unified error type for the data layer
//!
//! Wraps errors from both embedded backends (DuckDB and SQLite) while
//! preserving which backend generated them.

use thiserror::Error;

use crate::data::duckdb::DuckdbError;
use crate::data::sqlite::SqliteError;
use crate::table::TableError;

#[derive(Error, Debug)]
pub enum DataError {
    /// SQLite database error (views store)
    #[error("SQLite error: {0}")]
    Sqlite(sqlx::Error),

    /// DuckDB database error (table store)
    #[error("DuckDB error: {0}")]
    Duckdb(#[from] duckdb::Error),

    #[error("Migration {version} ({name}) failed on {backend}: {error}")]
    MigrationFailed {
        backend: &'static str,
        version: i32,
        name: String,
        error: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Query timeout after {timeout_secs}s on {backend}")]
    Timeout {
        backend: &'static str,
        timeout_secs: u64,
    },

    #[error("Backend {backend} is not available: {reason}")]
    BackendUnavailable {
        backend: &'static str,
        reason: String,
    },

    /// Rejected table query
    #[error(transparent)]
    Table(#[from] TableError),
}

impl DataError {
    pub fn from_sqlite(e: sqlx::Error) -> Self {
        Self::Sqlite(e)
    }

    pub fn migration_failed(backend: &'static str, version: i32, name: &str, error: &str) -> Self {
        Self::MigrationFailed {
            backend,
            version,
            name: name.to_string(),
            error: error.to_string(),
        }
    }

    pub fn timeout(backend: &'static str, timeout_secs: u64) -> Self {
        Self::Timeout {
            backend,
            timeout_secs,
        }
    }

    /// Connection-related errors that might succeed on retry
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::BackendUnavailable { .. } => true,
            Self::Sqlite(e) => matches!(
                e,
                sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)
            ),
            _ => false,
        }
    }

    pub fn backend(&self) -> &'static str {
        match self {
            Self::Sqlite(_) => "sqlite",
            Self::Duckdb(_) => "duckdb",
            Self::MigrationFailed { backend, .. }
            | Self::Timeout { backend, .. }
            | Self::BackendUnavailable { backend, .. } => backend,
            Self::Io(_) | Self::Table(_) => "unknown",
        }
    }
}

impl From<DuckdbError> for DataError {
    fn from(e: DuckdbError) -> Self {
        match e {
            DuckdbError::Database(e) => Self::Duckdb(e),
            DuckdbError::MigrationFailed {
                version,
                name,
                error,
            } => Self::MigrationFailed {
                backend: "duckdb",
                version,
                name,
                error,
            },
            DuckdbError::Io(e) => Self::Io(e),
            DuckdbError::Timeout { timeout_secs } => Self::Timeout {
                backend: "duckdb",
                timeout_secs,
            },
            DuckdbError::Closed => Self::BackendUnavailable {
                backend: "duckdb",
                reason: "connection closed".to_string(),
            },
            DuckdbError::Table(e) => Self::Table(e),
        }
    }
}

impl From<SqliteError> for DataError {
    fn from(e: SqliteError) -> Self {
        match e {
            SqliteError::Database(e) => Self::Sqlite(e),
            SqliteError::MigrationFailed {
                version,
                name,
                error,
            } => Self::MigrationFailed {
                backend: "sqlite",
                version,
                name,
                error,
            },
            SqliteError::Io(e) => Self::Io(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_failed_error_display() {
        let err = DataError::migration_failed("sqlite", 2, "table_views", "syntax error");
        assert_eq!(
            err.to_string(),
            "Migration 2 (table_views) failed on sqlite: syntax error"
        );
    }

    #[test]
    fn test_timeout_error_display() {
        let err = DataError::timeout("duckdb", 30);
        assert_eq!(err.to_string(), "Query timeout after 30s on duckdb");
        assert_eq!(err.backend(), "duckdb");
        assert!(err.is_transient());
    }

    #[test]
    fn test_closed_duckdb_is_unavailable() {
        let err: DataError = DuckdbError::Closed.into();
        assert_eq!(err.backend(), "duckdb");
        assert!(err.to_string().contains("connection closed"));
        assert!(err.is_transient());
    }

    #[test]
    fn test_table_error_passes_through() {
        let err: DataError =
            DuckdbError::Table(TableError::invalid_configuration("Unknown column 'x'")).into();
        assert!(matches!(err, DataError::Table(TableError::InvalidConfiguration(_))));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_sqlite_pool_timeout_is_transient() {
        let err: DataError = SqliteError::Database(sqlx::Error::PoolTimedOut).into();
        assert_eq!(err.backend(), "sqlite");
        assert!(err.is_transient());
    }
}
