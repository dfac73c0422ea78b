//! Data storage layer
//!
//! - `duckdb` - table store holding the demo employees table
//! - `sqlite` - saved table views
//! - `error` - unified error type for both backends

pub mod duckdb;
pub mod error;
pub mod sqlite;

pub use duckdb::DuckdbService;
pub use error::DataError;
pub use sqlite::SqliteService;

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::core::storage::AppStorage;
use crate::table::ViewStore;

/// Views store shared by the HTTP layer
pub type SharedViewStore = Arc<dyn ViewStore<Error = DataError>>;

/// Both database services, shared across the server
#[derive(Clone)]
pub struct DataServices {
    pub duckdb: Arc<DuckdbService>,
    pub sqlite: Arc<SqliteService>,
}

impl DataServices {
    /// File-backed databases under the storage directory
    pub async fn init(storage: &AppStorage) -> Result<Self, DataError> {
        let (duckdb, sqlite) = tokio::try_join!(
            async { DuckdbService::init(storage).await.map_err(DataError::from) },
            async { SqliteService::init(storage).await.map_err(DataError::from) },
        )
        .inspect_err(|e| tracing::error!(error = %e, backend = e.backend(), "Failed to open databases"))?;

        Ok(Self {
            duckdb: Arc::new(duckdb),
            sqlite: Arc::new(sqlite),
        })
    }

    /// Transient databases, lost on shutdown
    pub async fn in_memory() -> Result<Self, DataError> {
        let duckdb = DuckdbService::open_in_memory()?;
        let sqlite = SqliteService::open_in_memory().await?;
        Ok(Self {
            duckdb: Arc::new(duckdb),
            sqlite: Arc::new(sqlite),
        })
    }

    /// The views store as a trait object
    pub fn views(&self) -> SharedViewStore {
        Arc::new(Arc::clone(&self.sqlite))
    }

    pub fn start_checkpoint_tasks(&self, shutdown_rx: &watch::Receiver<bool>) -> Vec<JoinHandle<()>> {
        vec![
            self.duckdb.start_checkpoint_task(shutdown_rx.clone()),
            self.sqlite.start_checkpoint_task(shutdown_rx.clone()),
        ]
    }

    /// Checkpoint and close both databases
    pub async fn close(&self) {
        let duckdb = Arc::clone(&self.duckdb);
        let sqlite = Arc::clone(&self.sqlite);
        tokio::join!(
            async {
                if let Err(e) = sqlite.checkpoint().await {
                    tracing::warn!("SQLite checkpoint failed: {}", e);
                }
                sqlite.close().await;
            },
            async {
                if let Err(e) = duckdb.close().await {
                    tracing::warn!("DuckDB close failed: {}", e);
                }
            }
        );
        tracing::debug!("Databases closed");
    }
}
