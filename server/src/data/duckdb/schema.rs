//! DuckDB schema definitions
//!
//! Column names are the quoted canonical field names of the table entity so
//! compiled predicates can reference them directly.

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

pub const EMPLOYEES_TABLE: &str = "employees";

/// Complete schema SQL
pub const SCHEMA: &str = r#"
-- Infrastructure: Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    version INTEGER NOT NULL,
    applied_at BIGINT NOT NULL,
    description VARCHAR
);

-- Demo table served by the employees endpoints
CREATE TABLE IF NOT EXISTS employees (
    "rowId"                    BIGINT PRIMARY KEY,
    "canBeDeleted"             BOOLEAN NOT NULL,
    "username"                 VARCHAR NOT NULL,
    "age"                      INTEGER,
    "employmentStatusName"     VARCHAR,
    "employmentStatusNameList" VARCHAR,  -- ';' separated
    "birthdate"                TIMESTAMP, -- UTC
    "payedTaxes"               BOOLEAN NOT NULL,
    "salary"                   DOUBLE
);
"#;
