use clap::{Parser, Subcommand};

use std::path::PathBuf;

use super::constants::{
    ENV_CONFIG, ENV_DATA_DIR, ENV_EXPORT_BATCH_SIZE, ENV_HOST, ENV_IN_MEMORY, ENV_MAX_VIEWS,
    ENV_PORT, ENV_SEED_ROWS,
};

#[derive(Parser)]
#[command(name = "tablekit")]
#[command(version, about = "Server-side paging, sorting, filtering and export for data tables", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Server host address
    #[arg(long, short = 'H', global = true, env = ENV_HOST)]
    pub host: Option<String>,

    /// Server port
    #[arg(long, short = 'p', global = true, env = ENV_PORT)]
    pub port: Option<u16>,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Data directory for the databases
    #[arg(long, global = true, env = ENV_DATA_DIR)]
    pub data_dir: Option<PathBuf>,

    /// Keep both databases in memory (nothing is written to disk)
    #[arg(long, global = true, env = ENV_IN_MEMORY)]
    pub in_memory: Option<bool>,

    /// Demo rows generated when the employees table is empty
    #[arg(long, global = true, env = ENV_SEED_ROWS)]
    pub seed_rows: Option<u32>,

    /// Rows fetched per export batch
    #[arg(long, global = true, env = ENV_EXPORT_BATCH_SIZE)]
    pub export_batch_size: Option<u8>,

    /// Maximum saved views per user and table
    #[arg(long, global = true, env = ENV_MAX_VIEWS)]
    pub max_views: Option<u8>,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Start the server (default command)
    Start,
    /// Print the resolved configuration and exit
    Config,
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub config: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub in_memory: Option<bool>,
    pub seed_rows: Option<u32>,
    pub export_batch_size: Option<u8>,
    pub max_views: Option<u8>,
}

impl From<Cli> for CliConfig {
    fn from(cli: Cli) -> Self {
        Self {
            host: cli.host,
            port: cli.port,
            config: cli.config,
            data_dir: cli.data_dir,
            in_memory: cli.in_memory,
            seed_rows: cli.seed_rows,
            export_batch_size: cli.export_batch_size,
            max_views: cli.max_views,
        }
    }
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Option<Commands>) {
    let mut cli = Cli::parse();
    let command = cli.command.take();
    (cli.into(), command)
}
