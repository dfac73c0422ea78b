//! Core application

use anyhow::{Context, Result};

use crate::api::ApiServer;
use crate::core::cli::{self, CliConfig, Commands};
use crate::core::config::AppConfig;
use crate::core::constants::{APP_NAME_LOWER, ENV_LOG};
use crate::core::shutdown::ShutdownService;
use crate::core::storage::AppStorage;
use crate::data::DataServices;

pub struct CoreApp {
    pub shutdown: ShutdownService,
    pub config: AppConfig,
    pub data: DataServices,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        if let Some(Commands::Config) = command {
            let config = AppConfig::load(&cli_config)?;
            println!("{:#?}", config);
            return Ok(());
        }

        let app = Self::init(&cli_config).await?;
        Self::start_server(app).await
    }

    async fn init(cli: &CliConfig) -> Result<Self> {
        let config = AppConfig::load(cli)?;

        let data = if config.database.in_memory {
            tracing::info!("Using in-memory databases, nothing will be persisted");
            DataServices::in_memory()
                .await
                .context("Failed to open in-memory databases")?
        } else {
            let storage = AppStorage::init(&config.database).await?;
            DataServices::init(&storage)
                .await
                .with_context(|| format!("Failed to open databases in {}", storage.data_dir().display()))?
        };

        data.duckdb
            .seed_employees(config.database.seed_rows)
            .await
            .context("Failed to seed the employees table")?;

        let shutdown = ShutdownService::new(data.clone());

        Ok(Self {
            shutdown,
            config,
            data,
        })
    }

    fn init_logging() {
        let default_filter = format!("info,{}=info", APP_NAME_LOWER);

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        tracing_subscriber::fmt()
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_env_filter(filter)
            .init();
    }

    async fn start_server(app: Self) -> Result<()> {
        // Signal handlers go first so an early Ctrl+C still shuts down cleanly
        app.shutdown.install_signal_handlers();

        for handle in app.data.start_checkpoint_tasks(&app.shutdown.subscribe()) {
            app.shutdown.register(handle).await;
        }
        tracing::debug!("Background tasks started");

        let server = ApiServer::new(app);
        let app = server.start().await?;
        app.shutdown.shutdown().await;

        Ok(())
    }
}
