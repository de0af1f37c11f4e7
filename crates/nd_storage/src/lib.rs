use std::sync::Arc;

use async_trait::async_trait;
use nd_core::config::{StorageConfig, StorageKind};
use nd_core::{NewsStorage, Result};
use tracing::{error, info};

pub mod backends;

pub use backends::*;

#[async_trait]
pub trait StorageBackend: NewsStorage + Sized {
    fn name() -> &'static str;
    fn get_error_message() -> &'static str;
    async fn open(config: &StorageConfig) -> Result<Self>;
}

/// Open the backend selected in the configuration.
pub async fn create_storage(config: &StorageConfig) -> Result<Arc<dyn NewsStorage>> {
    match config.backend {
        StorageKind::Memory => open_backend::<InMemoryStorage>(config).await,
        #[cfg(feature = "sqlite")]
        StorageKind::Sqlite => open_backend::<SQLiteStorage>(config).await,
        #[cfg(not(feature = "sqlite"))]
        StorageKind::Sqlite => Err(nd_core::Error::Config(
            "this build does not include the sqlite backend".to_string(),
        )),
    }
}

async fn open_backend<T: StorageBackend + 'static>(
    config: &StorageConfig,
) -> Result<Arc<dyn NewsStorage>> {
    let storage = T::open(config).await.map_err(|e| {
        error!(backend = T::name(), error = %e, "{}", T::get_error_message());
        e
    })?;
    info!(backend = T::name(), "storage backend ready");
    Ok(Arc::new(storage))
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::{create_storage, StorageBackend};
}
