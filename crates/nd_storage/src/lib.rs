use std::sync::Arc;
use async_trait::async_trait;
use nd_core::{CacheStore, Error, Result};
use tracing::info;

pub mod backends;
pub mod cache;

pub use backends::*;
pub use cache::{ArticleCache, CachedKeyword, DEFAULT_TTL, KEYWORD_PREFIX, NEWS_PREFIX};

#[async_trait]
pub trait StorageBackend: CacheStore {
    fn get_error_message() -> &'static str;
    async fn new(config: &BackendConfig) -> Result<Self> where Self: Sized;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    pub url: String,
}

impl BackendConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

async fn open<T: StorageBackend + 'static>(config: &BackendConfig) -> Result<Arc<dyn CacheStore>> {
    let store = T::new(config).await.map_err(|e| {
        Error::Storage(format!("{} ({})", T::get_error_message(), e))
    })?;
    let store: Arc<dyn CacheStore> = Arc::new(store);
    Ok(store)
}

/// Open the cache backend named by `kind` ("memory" or "sqlite").
pub async fn create_storage(kind: &str, url: Option<&str>) -> Result<Arc<dyn CacheStore>> {
    let store = match kind {
        "memory" => open::<MemoryStore>(&BackendConfig::new(url.unwrap_or("memory://"))).await?,
        #[cfg(feature = "sqlite")]
        "sqlite" => open::<SQLiteStore>(&BackendConfig::new(url.unwrap_or("news_cache.db"))).await?,
        other => {
            return Err(Error::Config(format!("Unsupported storage backend: {}", other)));
        }
    };
    store.ping().await?;
    info!("💾 Cache storage ready (using {})", kind);
    Ok(store)
}

pub mod prelude {
    pub use super::{create_storage, ArticleCache, BackendConfig, StorageBackend};
    pub use super::backends::*;
}
