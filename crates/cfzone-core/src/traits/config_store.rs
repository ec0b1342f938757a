// # Config Store Trait
//
// Defines the interface to the host's persisted settings.
//
// ## Purpose
//
// The settings store holds the operator-entered credentials and the selected
// zone under the keys `apikey`, `email` and `zone`. It is read once at
// startup and written back when a zone is discovered or the admin settings
// form is submitted.
//
// ## Implementations
//
// - Memory: tests and embedded hosts that own persistence themselves
// - File: JSON file with atomic writes and backup recovery

use async_trait::async_trait;
use std::collections::BTreeMap;

/// Trait for persisted settings implementations
///
/// # Thread Safety
///
/// All methods must be safe to call concurrently from multiple tasks.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Read a setting
    ///
    /// # Returns
    ///
    /// - `Ok(Some(value))`: The stored value
    /// - `Ok(None)`: Key not set
    /// - `Err(Error)`: Storage error
    async fn get(&self, key: &str) -> Result<Option<String>, crate::Error>;

    /// Write a setting
    ///
    /// Implementations must make the value durable before returning.
    async fn set(&self, key: &str, value: &str) -> Result<(), crate::Error>;

    /// Remove a setting (no-op if absent)
    async fn remove(&self, key: &str) -> Result<(), crate::Error>;

    /// Snapshot of every stored setting
    async fn all(&self) -> Result<BTreeMap<String, String>, crate::Error>;
}
