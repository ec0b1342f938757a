//! Plugin-based zone API registry
//!
//! Vendor clients are registered by name at startup and built from
//! configuration, so hosts never hard-code a vendor constructor.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cfzone_core::registry::ZoneApiRegistry;
//! use cfzone_core::config::ProviderConfig;
//!
//! let registry = ZoneApiRegistry::new();
//! cfzone_provider_cloudflare::register(&registry);
//!
//! let api = registry.create_zone_api(&credentials, &ProviderConfig::default())?;
//! ```

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::config::ProviderConfig;
use crate::credentials::Credentials;
use crate::error::{Error, Result};
use crate::traits::{ZoneApi, ZoneApiFactory};

/// Registry of zone API factories keyed by provider name
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct ZoneApiRegistry {
    providers: RwLock<HashMap<String, Box<dyn ZoneApiFactory>>>,
}

impl ZoneApiRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a zone API factory
    ///
    /// Registering the same name twice replaces the earlier factory.
    pub fn register_provider(&self, name: impl Into<String>, factory: Box<dyn ZoneApiFactory>) {
        let name = name.into();
        let mut providers = self.providers.write().unwrap_or_else(PoisonError::into_inner);
        providers.insert(name, factory);
    }

    /// Build the zone API named by `config.kind`
    ///
    /// # Errors
    ///
    /// - `MissingCredentials`: no API key
    /// - `Config`: unknown provider, or the factory rejected the options
    pub fn create_zone_api(
        &self,
        credentials: &Credentials,
        config: &ProviderConfig,
    ) -> Result<Arc<dyn ZoneApi>> {
        if !credentials.is_valid() {
            return Err(Error::missing_credentials(
                "An API key is required to build a zone API client",
            ));
        }

        let providers = self.providers.read().unwrap_or_else(PoisonError::into_inner);
        let factory = providers
            .get(&config.kind)
            .ok_or_else(|| Error::config(format!("Unknown provider type: {}", config.kind)))?;

        factory.create(credentials, config).map(Arc::from)
    }

    /// List all registered provider names
    pub fn list_providers(&self) -> Vec<String> {
        let providers = self.providers.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = providers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a provider name is registered
    pub fn has_provider(&self, name: &str) -> bool {
        let providers = self.providers.read().unwrap_or_else(PoisonError::into_inner);
        providers.contains_key(name)
    }
}
