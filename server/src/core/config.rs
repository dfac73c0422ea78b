use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::table::columns::{
    DEFAULT_ALLOWED_ITEMS_PER_PAGE, DEFAULT_DATE_CULTURE, DEFAULT_DATE_FORMAT,
    DEFAULT_DATE_TIMEZONE, DEFAULT_EXPORT_DATE_FORMAT, DEFAULT_MAX_VIEWS,
};
use crate::table::export::{DEFAULT_EXPORT_BATCH_SIZE, DEFAULT_SHEET_NAME};
use crate::table::{ColumnMetadataOverride, ExportOptions, TableOptions};
use crate::utils::file::expand_path;

use super::cli::CliConfig;
use super::constants::{
    APP_DOT_FOLDER, CONFIG_FILE_NAME, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_SEED_ROWS,
};

// =============================================================================
// File Config Structs (JSON, every field optional)
// =============================================================================

/// Server configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ServerFileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Table defaults section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct TableFileConfig {
    pub allowed_items_per_page: Option<Vec<u8>>,
    pub date_format: Option<String>,
    pub date_timezone: Option<String>,
    pub date_culture: Option<String>,
    pub max_views: Option<u8>,
    pub export_date_format: Option<String>,
    pub export_batch_size: Option<u8>,
    pub export_sheet_name: Option<String>,
    /// Published column metadata overrides keyed by field name
    pub column_overrides: Option<HashMap<String, ColumnMetadataOverride>>,
}

/// Database configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct DatabaseFileConfig {
    pub data_dir: Option<String>,
    pub in_memory: Option<bool>,
    pub seed_rows: Option<u32>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub server: Option<ServerFileConfig>,
    pub table: Option<TableFileConfig>,
    pub database: Option<DatabaseFileConfig>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

/// Overwrite `target` when `value` is set
fn merge_field<T: std::fmt::Debug>(target: &mut Option<T>, value: Option<T>, name: &str) {
    if value.is_some() {
        tracing::trace!(value = ?value, "Merging {}", name);
        *target = value;
    }
}

impl FileConfig {
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        if let Some(server) = other.server {
            let current = self.server.get_or_insert_with(ServerFileConfig::default);
            merge_field(&mut current.host, server.host, "server.host");
            merge_field(&mut current.port, server.port, "server.port");
        }

        if let Some(table) = other.table {
            let current = self.table.get_or_insert_with(TableFileConfig::default);
            merge_field(
                &mut current.allowed_items_per_page,
                table.allowed_items_per_page,
                "table.allowed_items_per_page",
            );
            merge_field(&mut current.date_format, table.date_format, "table.date_format");
            merge_field(&mut current.date_timezone, table.date_timezone, "table.date_timezone");
            merge_field(&mut current.date_culture, table.date_culture, "table.date_culture");
            merge_field(&mut current.max_views, table.max_views, "table.max_views");
            merge_field(
                &mut current.export_date_format,
                table.export_date_format,
                "table.export_date_format",
            );
            merge_field(
                &mut current.export_batch_size,
                table.export_batch_size,
                "table.export_batch_size",
            );
            merge_field(
                &mut current.export_sheet_name,
                table.export_sheet_name,
                "table.export_sheet_name",
            );
            if let Some(overrides) = table.column_overrides {
                tracing::trace!(columns = overrides.len(), "Merging table.column_overrides");
                current
                    .column_overrides
                    .get_or_insert_with(HashMap::new)
                    .extend(overrides);
            }
        }

        if let Some(database) = other.database {
            let current = self.database.get_or_insert_with(DatabaseFileConfig::default);
            merge_field(&mut current.data_dir, database.data_dir, "database.data_dir");
            merge_field(&mut current.in_memory, database.in_memory, "database.in_memory");
            merge_field(&mut current.seed_rows, database.seed_rows, "database.seed_rows");
        }
    }
}

// =============================================================================
// Runtime Config Structs (final merged configuration)
// =============================================================================

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Defaults published with every table configuration and used by exports
#[derive(Debug, Clone, Default)]
pub struct TableConfig {
    pub options: TableOptions,
    pub export: ExportOptions,
    pub column_overrides: HashMap<String, ColumnMetadataOverride>,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Overrides the platform data directory
    pub data_dir: Option<PathBuf>,
    pub in_memory: bool,
    pub seed_rows: u32,
}

/// Final merged application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub table: TableConfig,
    pub database: DatabaseConfig,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Profile directory config (~/.tablekit/tablekit.json)
    /// 3. Local directory config OR CLI-specified config path
    /// 4. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading application configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        if let Some(profile_path) = get_profile_config_path()
            && profile_path.exists()
        {
            let profile_config = FileConfig::load_from_file(&profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        let overlay_path = if let Some(ref path) = cli.config {
            let expanded = expand_path(&path.to_string_lossy());
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            Some(expanded)
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        let config = Self::layer(file_config, cli);
        config.validate()?;
        Ok(config)
    }

    /// Defaults -> file config -> CLI/env overrides
    fn layer(file_config: FileConfig, cli: &CliConfig) -> Self {
        let file_server = file_config.server.unwrap_or_default();
        let file_table = file_config.table.unwrap_or_default();
        let file_database = file_config.database.unwrap_or_default();

        let server = ServerConfig {
            host: cli
                .host
                .clone()
                .or(file_server.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: cli.port.or(file_server.port).unwrap_or(DEFAULT_PORT),
        };

        let table = TableConfig {
            options: TableOptions {
                allowed_items_per_page: file_table
                    .allowed_items_per_page
                    .unwrap_or_else(|| DEFAULT_ALLOWED_ITEMS_PER_PAGE.to_vec()),
                date_format: file_table
                    .date_format
                    .unwrap_or_else(|| DEFAULT_DATE_FORMAT.to_string()),
                date_timezone: file_table
                    .date_timezone
                    .unwrap_or_else(|| DEFAULT_DATE_TIMEZONE.to_string()),
                date_culture: file_table
                    .date_culture
                    .unwrap_or_else(|| DEFAULT_DATE_CULTURE.to_string()),
                max_views: cli
                    .max_views
                    .or(file_table.max_views)
                    .unwrap_or(DEFAULT_MAX_VIEWS),
                export_date_format: file_table
                    .export_date_format
                    .unwrap_or_else(|| DEFAULT_EXPORT_DATE_FORMAT.to_string()),
            },
            export: ExportOptions {
                sheet_name: file_table
                    .export_sheet_name
                    .unwrap_or_else(|| DEFAULT_SHEET_NAME.to_string()),
                batch_size: cli
                    .export_batch_size
                    .or(file_table.export_batch_size)
                    .unwrap_or(DEFAULT_EXPORT_BATCH_SIZE),
            },
            column_overrides: file_table.column_overrides.unwrap_or_default(),
        };

        let database = DatabaseConfig {
            data_dir: cli
                .data_dir
                .as_ref()
                .map(|p| expand_path(&p.to_string_lossy()))
                .or_else(|| file_database.data_dir.as_deref().map(expand_path)),
            in_memory: cli.in_memory.or(file_database.in_memory).unwrap_or(false),
            seed_rows: cli
                .seed_rows
                .or(file_database.seed_rows)
                .unwrap_or(DEFAULT_SEED_ROWS),
        };

        Self {
            server,
            table,
            database,
        }
    }

    /// Validate the configuration for consistency and correctness
    fn validate(&self) -> Result<()> {
        if self.server.host.is_empty() {
            anyhow::bail!("Configuration error: server.host must not be empty");
        }
        if self.server.port == 0 {
            anyhow::bail!("Configuration error: server.port must be greater than 0");
        }

        let sizes = &self.table.options.allowed_items_per_page;
        if sizes.is_empty() {
            anyhow::bail!("Configuration error: table.allowed_items_per_page must not be empty");
        }
        if sizes.contains(&0) {
            anyhow::bail!(
                "Configuration error: table.allowed_items_per_page must only contain sizes greater than 0"
            );
        }

        if self.table.export.batch_size == 0 {
            anyhow::bail!("Configuration error: table.export_batch_size must be greater than 0");
        }
        if self.table.export.sheet_name.trim().is_empty() {
            anyhow::bail!("Configuration error: table.export_sheet_name must not be empty");
        }

        Ok(())
    }
}

/// Get the profile config path (~/.tablekit/tablekit.json)
fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}
