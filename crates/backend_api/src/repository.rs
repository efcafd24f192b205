use async_trait::async_trait;
use database::KeyValueStore;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::error::{ApiError, Result};

/// Repository trait for the calculator worksheets.
/// This abstraction allows swapping the file-backed store for an in-memory one in tests.
#[async_trait]
pub trait CalculatorRepository: Send + Sync {
    async fn fetch_document(&self, key: &str) -> Result<Option<Value>>;
    async fn store_document(&self, key: &str, value: Value) -> Result<()>;
}

impl dyn CalculatorRepository {
    /// Typed read. A missing or corrupt document yields `fallback`.
    pub async fn load<T>(&self, key: &str, fallback: T) -> T
    where
        T: DeserializeOwned + Send,
    {
        match self.fetch_document(key).await {
            Ok(Some(raw)) => serde_json::from_value(raw).unwrap_or_else(|err| {
                tracing::warn!(key, error = %err, "stored document is corrupt, using fallback");
                fallback
            }),
            Ok(None) => fallback,
            Err(err) => {
                tracing::warn!(key, error = %err, "store read failed, using fallback");
                fallback
            }
        }
    }

    pub async fn save<T>(&self, key: &str, value: &T) -> Result<()>
    where
        T: Serialize + Sync,
    {
        let raw = serde_json::to_value(value)?;
        self.store_document(key, raw).await
    }
}

/// Repository over any synchronous [`KeyValueStore`]; store calls run on the blocking pool.
pub struct StoreRepository {
    store: Arc<dyn KeyValueStore>,
}

impl StoreRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CalculatorRepository for StoreRepository {
    async fn fetch_document(&self, key: &str) -> Result<Option<Value>> {
        let store = Arc::clone(&self.store);
        let key = key.to_string();
        tokio::task::spawn_blocking(move || store.read(&key))
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))?
            .map_err(ApiError::from)
    }

    async fn store_document(&self, key: &str, value: Value) -> Result<()> {
        let store = Arc::clone(&self.store);
        let key = key.to_string();
        tokio::task::spawn_blocking(move || store.write(&key, value))
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))?
            .map_err(ApiError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use database::MemoryStore;
    use models::{keys, SalesForecast};
    use serde_json::json;

    fn repo(store: MemoryStore) -> Arc<dyn CalculatorRepository> {
        Arc::new(StoreRepository::new(Arc::new(store)))
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let repo = repo(MemoryStore::default());
        let mut sales = SalesForecast::default();
        sales.units_sold.set(3, 7.0);

        repo.save(keys::SALES_FORECAST, &sales).await.unwrap();
        let loaded = repo.load(keys::SALES_FORECAST, SalesForecast::default()).await;
        assert_eq!(loaded, sales);
    }

    #[tokio::test]
    async fn test_corrupt_document_uses_fallback() {
        let store = MemoryStore::default();
        store.write(keys::SALES_FORECAST, json!("not a table")).unwrap();
        let repo = repo(store);

        let loaded = repo.load(keys::SALES_FORECAST, SalesForecast::default()).await;
        assert_eq!(loaded, SalesForecast::default());
    }
}
