// # Memory Config Store
//
// In-memory implementation of ConfigStore.
//
// ## Purpose
//
// Useful for testing and for hosts that load settings from their own
// persistence layer and hand them over at startup. Nothing survives a
// restart: a zone discovered at runtime will be looked up again.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::ConfigStore;

/// In-memory settings store
///
/// # Example
///
/// ```rust
/// use cfzone_core::store::MemoryConfigStore;
/// use cfzone_core::traits::ConfigStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryConfigStore::from_pairs([("apikey", "k-123")]);
///
///     assert_eq!(store.get("apikey").await?.as_deref(), Some("k-123"));
///     assert_eq!(store.get("zone").await?, None);
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigStore {
    inner: Arc<RwLock<BTreeMap<String, String>>>,
}

impl MemoryConfigStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with settings
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let map = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            inner: Arc::new(RwLock::new(map)),
        }
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.remove(key);
        Ok(())
    }

    async fn all(&self) -> Result<BTreeMap<String, String>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_basic() {
        let store = MemoryConfigStore::new();
        assert!(store.all().await.unwrap().is_empty());

        store.set("zone", "abc").await.unwrap();
        assert_eq!(store.get("zone").await.unwrap().as_deref(), Some("abc"));

        store.remove("zone").await.unwrap();
        assert_eq!(store.get("zone").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_store_clones_share_state() {
        let store = MemoryConfigStore::from_pairs([("apikey", "k")]);
        let other = store.clone();

        other.set("zone", "abc").await.unwrap();
        assert_eq!(store.get("zone").await.unwrap().as_deref(), Some("abc"));
        assert_eq!(store.all().await.unwrap().len(), 2);
    }
}
