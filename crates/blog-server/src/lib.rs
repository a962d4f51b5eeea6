pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod service;
pub mod store;

use std::sync::Arc;

pub use config::{Config, StorageBackend};
pub use db::DbPool;
pub use error::AppError;
pub use service::BlogService;

use store::{BlogStore, FileStore, PgStore};

/// Opens the storage backend selected in `config`.
pub async fn open_store(config: &Config) -> anyhow::Result<Arc<dyn BlogStore>> {
    let store: Arc<dyn BlogStore> = match config.backend {
        StorageBackend::File => {
            tracing::info!("Using file storage at {}", config.data_file.display());
            Arc::new(FileStore::open(&config.data_file).await?)
        }
        StorageBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))?;
            let pool = db::create_pool(url, config.database_max_connections).await?;
            db::init_schema(&pool).await?;
            tracing::info!("Using Postgres storage");
            Arc::new(PgStore::new(pool))
        }
    };

    Ok(store)
}
