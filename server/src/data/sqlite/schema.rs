//! SQLite schema definitions
//!
//! Fresh databases get the latest schema in one step; older files are brought
//! forward by the versioned migrations.

/// Current schema version
pub const SCHEMA_VERSION: i32 = 2;

/// Complete schema SQL
pub const SCHEMA: &str = r#"
-- =============================================================================
-- Infrastructure: Schema version tracking
-- =============================================================================
CREATE TABLE IF NOT EXISTS schema_version (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    version INTEGER NOT NULL,
    applied_at INTEGER NOT NULL,
    description TEXT
);

CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at INTEGER NOT NULL,
    checksum TEXT NOT NULL,
    execution_time_ms INTEGER,
    success INTEGER NOT NULL DEFAULT 1
);

-- =============================================================================
-- Saved table views (one row per user, table key and alias)
-- =============================================================================
CREATE TABLE IF NOT EXISTS table_views (
    username TEXT NOT NULL,
    table_key TEXT NOT NULL CHECK(length(table_key) >= 1),
    view_alias TEXT NOT NULL CHECK(length(view_alias) >= 1),
    view_data TEXT NOT NULL,
    last_active INTEGER NOT NULL DEFAULT 0,
    updated_at INTEGER NOT NULL,
    PRIMARY KEY (username, table_key, view_alias)
);

CREATE INDEX IF NOT EXISTS idx_table_views_active ON table_views(username, table_key) WHERE last_active = 1;
"#;

/// v2: partial index for the last active view
pub const MIGRATION_V2: &str = "CREATE INDEX IF NOT EXISTS idx_table_views_active ON table_views(username, table_key) WHERE last_active = 1";
