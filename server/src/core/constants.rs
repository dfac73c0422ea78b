// =============================================================================
// Application Identity
// =============================================================================

/// Application name in title case (for display and platform directories)
pub const APP_NAME: &str = "TableKit";

/// Application name in lowercase (for paths and identifiers)
pub const APP_NAME_LOWER: &str = "tablekit";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".tablekit";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "tablekit.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "TABLEKIT_CONFIG";

// =============================================================================
// Environment Variables - Server
// =============================================================================

/// Environment variable for server host
pub const ENV_HOST: &str = "TABLEKIT_HOST";

/// Environment variable for server port
pub const ENV_PORT: &str = "TABLEKIT_PORT";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "TABLEKIT_LOG";

// =============================================================================
// Server Defaults
// =============================================================================

/// Default server host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port
pub const DEFAULT_PORT: u16 = 5390;

/// Header carrying the caller's username for the views endpoints
pub const USER_HEADER: &str = "x-user";

/// Username used when the header is absent
pub const DEFAULT_USERNAME: &str = "local";

/// Request body limit (bytes)
pub const MAX_REQUEST_BODY_BYTES: usize = 2 * 1024 * 1024;

// =============================================================================
// Environment Variables - Storage
// =============================================================================

/// Environment variable to override data directory
pub const ENV_DATA_DIR: &str = "TABLEKIT_DATA_DIR";

/// Environment variable to keep both databases in memory
pub const ENV_IN_MEMORY: &str = "TABLEKIT_IN_MEMORY";

/// Environment variable for the number of demo rows seeded on first start
pub const ENV_SEED_ROWS: &str = "TABLEKIT_SEED_ROWS";

/// Default number of demo rows
pub const DEFAULT_SEED_ROWS: u32 = 1000;

// =============================================================================
// Table Defaults
// =============================================================================

/// Environment variable for the export batch size
pub const ENV_EXPORT_BATCH_SIZE: &str = "TABLEKIT_EXPORT_BATCH_SIZE";

/// Environment variable for the maximum saved views per table
pub const ENV_MAX_VIEWS: &str = "TABLEKIT_MAX_VIEWS";

// =============================================================================
// SQLite
// =============================================================================

/// SQLite database filename
pub const SQLITE_DB_FILENAME: &str = "tablekit.db";

/// Maximum connections in the pool
pub const SQLITE_MAX_CONNECTIONS: u32 = 5;

/// Busy timeout (seconds)
pub const SQLITE_BUSY_TIMEOUT_SECS: u64 = 30;

/// Page cache size (negative = KiB)
pub const SQLITE_CACHE_SIZE: &str = "-16000";

/// Pages between automatic WAL checkpoints
pub const SQLITE_WAL_AUTOCHECKPOINT: &str = "1000";

/// Interval between explicit WAL checkpoints (seconds)
pub const SQLITE_CHECKPOINT_INTERVAL_SECS: u64 = 300;

// =============================================================================
// DuckDB
// =============================================================================

/// DuckDB database filename
pub const DUCKDB_DB_FILENAME: &str = "tablekit.duckdb";

/// Interval between checkpoints (seconds)
pub const DUCKDB_CHECKPOINT_INTERVAL_SECS: u64 = 300;

/// Timeout for a single table query (seconds)
pub const DUCKDB_QUERY_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// Shutdown
// =============================================================================

/// Maximum time to wait for background tasks during shutdown (seconds)
pub const SHUTDOWN_TIMEOUT_SECS: u64 = 30;
