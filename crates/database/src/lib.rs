//! # Database
//!
//! Key-value persistence for the planning worksheets. Every calculator reads and
//! writes one JSON document under a well-known key (see `models::keys`); pages
//! compose figures by reading each other's keys.
//!
//! Reads never fail the caller: a missing key or a document that no longer
//! matches the expected shape yields the caller's fallback.
//!
//! ```rust,no_run
//! use database::{JsonFileStore, StoreExt};
//!
//! let store = JsonFileStore::open("database/planner.json")?;
//! let rows: Vec<String> = store.load("some_key", Vec::new());
//! store.save("some_key", &rows)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod file_store;
pub mod memory_store;

use anyhow::Result;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

pub use crate::file_store::JsonFileStore;
pub use crate::memory_store::MemoryStore;

/// Raw key -> JSON document storage.
/// Implementations must make each single-key read or write atomic.
pub trait KeyValueStore: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<Value>>;
    fn write(&self, key: &str, value: Value) -> Result<()>;
    fn keys(&self) -> Result<Vec<String>>;
}

/// Typed `load(key, fallback)` / `save(key, value)` on top of any store.
pub trait StoreExt: KeyValueStore {
    fn load<T: DeserializeOwned>(&self, key: &str, fallback: T) -> T {
        let raw = match self.read(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return fallback,
            Err(err) => {
                tracing::warn!(key, error = %err, "store read failed, using fallback");
                return fallback;
            }
        };
        match serde_json::from_value(raw) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(key, error = %err, "stored document is corrupt, using fallback");
                fallback
            }
        }
    }

    fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_value(value)?;
        self.write(key, raw)
    }
}

impl<S: KeyValueStore + ?Sized> StoreExt for S {}

#[cfg(test)]
mod tests {
    use super::*;
    use models::{keys, SalesForecast};
    use serde_json::json;

    #[test]
    fn test_save_then_load_returns_saved_value() {
        let store = MemoryStore::default();
        let mut sales = SalesForecast::default();
        sales.units_sold.set(0, 10.0);

        store.save(keys::SALES_FORECAST, &sales).unwrap();
        let loaded = store.load(keys::SALES_FORECAST, SalesForecast::default());
        assert_eq!(loaded, sales);
    }

    #[test]
    fn test_unknown_key_returns_fallback() {
        let store = MemoryStore::default();
        let loaded: Vec<u32> = store.load("nope", vec![1, 2, 3]);
        assert_eq!(loaded, vec![1, 2, 3]);
    }

    #[test]
    fn test_corrupt_document_returns_fallback() {
        let store = MemoryStore::default();
        store.write(keys::SALARY_PLANNER, json!("not a roster")).unwrap();
        let loaded = store.load(keys::SALARY_PLANNER, models::SalaryPlan::empty());
        assert!(loaded.rows.is_empty());
    }

    #[test]
    fn test_works_through_trait_object() {
        let store: Box<dyn KeyValueStore> = Box::new(MemoryStore::default());
        store.save("answer", &42).unwrap();
        assert_eq!(store.load("answer", 0), 42);
    }
}
