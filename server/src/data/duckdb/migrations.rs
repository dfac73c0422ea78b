//! Database schema initialization and migrations
//!
//! Handles schema version tracking and incremental migrations.

use duckdb::Connection;

use super::error::DuckdbError;
use super::in_transaction;
use super::schema::{SCHEMA, SCHEMA_VERSION};
use crate::utils::crypto::sha256_hex;

/// Initialize database schema or run pending migrations
pub fn run_migrations(conn: &Connection) -> Result<(), DuckdbError> {
    let table_exists: bool = conn
        .query_row(
            "SELECT COUNT(*) > 0 FROM information_schema.tables WHERE table_name = 'schema_version'",
            [],
            |row| row.get(0),
        )
        .unwrap_or(false);

    if !table_exists {
        tracing::debug!(version = SCHEMA_VERSION, "Initializing DuckDB schema");
        return apply_initial_schema(conn);
    }

    let current_version: i32 = conn
        .query_row(
            "SELECT version FROM schema_version WHERE id = 1",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    if current_version > SCHEMA_VERSION {
        return Err(DuckdbError::MigrationFailed {
            version: current_version,
            name: "version_check".to_string(),
            error: format!(
                "Database schema version {} is newer than application version {}",
                current_version, SCHEMA_VERSION
            ),
        });
    }

    for version in (current_version + 1)..=SCHEMA_VERSION {
        apply_migration(conn, version)?;
    }

    Ok(())
}

fn apply_initial_schema(conn: &Connection) -> Result<(), DuckdbError> {
    let start = std::time::Instant::now();

    in_transaction(conn, |conn| {
        conn.execute_batch(SCHEMA)
            .map_err(|e| DuckdbError::MigrationFailed {
                version: SCHEMA_VERSION,
                name: "initial_schema".to_string(),
                error: e.to_string(),
            })?;

        let now = chrono::Utc::now().timestamp_nanos_opt().unwrap_or(0);
        conn.execute(
            "INSERT INTO schema_version (id, version, applied_at, description) VALUES (1, ?, ?, 'Initial schema')",
            duckdb::params![SCHEMA_VERSION, now],
        )?;

        tracing::debug!(
            checksum = &sha256_hex(SCHEMA)[..8],
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Applied initial DuckDB schema"
        );
        Ok(())
    })
}

fn apply_migration(_conn: &Connection, version: i32) -> Result<(), DuckdbError> {
    match version {
        1 => Ok(()),
        _ => Err(DuckdbError::MigrationFailed {
            version,
            name: "unknown".to_string(),
            error: format!("Unknown migration version: {}", version),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_db() -> Connection {
        Connection::open_in_memory().expect("Failed to create in-memory database")
    }

    #[test]
    fn test_run_migrations_fresh_database() {
        let conn = create_test_db();
        run_migrations(&conn).expect("Migrations should succeed on fresh database");

        let version: i32 = conn
            .query_row(
                "SELECT version FROM schema_version WHERE id = 1",
                [],
                |row| row.get(0),
            )
            .expect("Should be able to read schema version");
        assert_eq!(version, SCHEMA_VERSION);

        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM employees", [], |row| row.get(0))
            .expect("employees table should exist");
        assert_eq!(rows, 0);
    }

    #[test]
    fn test_run_migrations_idempotent() {
        let conn = create_test_db();
        run_migrations(&conn).expect("First migration should succeed");
        assert!(run_migrations(&conn).is_ok());

        let count: i32 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
            .expect("Should count schema_version rows");
        assert_eq!(count, 1);
    }

    #[test]
    fn test_newer_schema_is_rejected() {
        let conn = create_test_db();
        run_migrations(&conn).expect("Initial migrations should succeed");
        conn.execute("UPDATE schema_version SET version = 99 WHERE id = 1", [])
            .expect("update version");

        match run_migrations(&conn) {
            Err(DuckdbError::MigrationFailed { version, .. }) => assert_eq!(version, 99),
            other => panic!("Expected MigrationFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_apply_migration_unknown_version() {
        let conn = create_test_db();
        assert!(matches!(
            apply_migration(&conn, 999),
            Err(DuckdbError::MigrationFailed { version: 999, .. })
        ));
    }
}
