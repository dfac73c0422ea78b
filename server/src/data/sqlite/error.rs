//! SQLite error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SqliteError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration {version} ({name}) failed: {error}")]
    MigrationFailed {
        version: i32,
        name: String,
        error: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_failed_display() {
        let err = SqliteError::MigrationFailed {
            version: 2,
            name: "index_active_table_views".to_string(),
            error: "no such table: table_views".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Migration 2 (index_active_table_views) failed: no such table: table_views"
        );
    }

    #[test]
    fn test_pool_closed_is_database_error() {
        let err: SqliteError = sqlx::Error::PoolClosed.into();
        assert!(matches!(err, SqliteError::Database(sqlx::Error::PoolClosed)));
    }
}
