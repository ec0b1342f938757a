//! Vendor API credentials
//!
//! The [`CredentialStore`] is loaded once from the persisted settings and
//! shared by every component that talks to the vendor. Only the zone id can
//! change afterwards, when it is discovered or selected.

use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::{CoreConfig, KEY_API_KEY, KEY_EMAIL, KEY_ZONE};
use crate::error::Result;
use crate::traits::{ConfigStore, Diagnostic, Diagnostics};

/// Account credentials for the vendor API
///
/// # Security
///
/// The Debug implementation intentionally does NOT expose the API key.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// Global API key or API token
    /// ⚠️ NEVER log this value
    pub api_key: Option<String>,
    /// Account email; required by the vendor for global API keys only
    pub email: Option<String>,
    /// Selected zone, meaningful only with an API key
    pub zone_id: Option<String>,
}

impl Credentials {
    /// Credentials with just an API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            email: None,
            zone_id: None,
        }
    }

    /// Set the account email
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Set the zone id
    pub fn with_zone_id(mut self, zone_id: impl Into<String>) -> Self {
        self.zone_id = Some(zone_id.into());
        self
    }

    /// The API key, if present and non-empty
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.is_empty())
    }

    /// True iff an API key is present and non-empty
    pub fn is_valid(&self) -> bool {
        self.api_key().is_some()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key.as_ref().map(|_| "<REDACTED>"))
            .field("email", &self.email)
            .field("zone_id", &self.zone_id)
            .finish()
    }
}

/// Holds the credentials and the selected zone for the whole process
pub struct CredentialStore {
    api_key: Option<String>,
    email: Option<String>,
    zone_id: RwLock<Option<String>>,
    store: Arc<dyn ConfigStore>,
    diagnostics: Arc<dyn Diagnostics>,
    settings_url: String,
}

impl CredentialStore {
    /// Load credentials from the persisted settings
    ///
    /// Empty values are treated as absent.
    pub async fn load(
        store: Arc<dyn ConfigStore>,
        diagnostics: Arc<dyn Diagnostics>,
        config: &CoreConfig,
    ) -> Result<Self> {
        let api_key = non_empty(store.get(KEY_API_KEY).await?);
        let email = non_empty(store.get(KEY_EMAIL).await?);
        let zone_id = non_empty(store.get(KEY_ZONE).await?);

        tracing::debug!(
            has_api_key = api_key.is_some(),
            has_email = email.is_some(),
            has_zone = zone_id.is_some(),
            "Loaded credentials"
        );

        Ok(Self {
            api_key,
            email,
            zone_id: RwLock::new(zone_id),
            store,
            diagnostics,
            settings_url: config.settings_url.clone(),
        })
    }

    /// Check that an API key has been entered
    ///
    /// Reports a diagnostic pointing at the settings screen when it hasn't.
    pub fn has_valid_credentials(&self) -> bool {
        if self.api_key.as_deref().is_some_and(|k| !k.is_empty()) {
            return true;
        }

        self.diagnostics
            .report(Diagnostic::missing_credentials(&self.settings_url));
        false
    }

    /// Current credentials, including the zone if one is known
    pub async fn credentials(&self) -> Credentials {
        Credentials {
            api_key: self.api_key.clone(),
            email: self.email.clone(),
            zone_id: self.zone_id.read().await.clone(),
        }
    }

    /// The configured or previously resolved zone id
    pub async fn zone_id(&self) -> Option<String> {
        self.zone_id.read().await.clone()
    }

    /// Select a zone and persist it
    ///
    /// The in-memory value only changes once the store accepted the write.
    pub async fn set_zone_id(&self, zone_id: &str) -> Result<()> {
        if zone_id.is_empty() {
            return Err(crate::Error::invalid_input("Zone id cannot be empty"));
        }

        let mut guard = self.zone_id.write().await;
        self.store.set(KEY_ZONE, zone_id).await?;
        *guard = Some(zone_id.to_string());

        tracing::info!("Default zone set to {}", zone_id);
        Ok(())
    }

    /// Use a zone for the rest of this process without persisting it
    pub(crate) async fn cache_zone_id(&self, zone_id: &str) {
        *self.zone_id.write().await = Some(zone_id.to_string());
    }

    /// Where operators fix credentials
    pub fn settings_url(&self) -> &str {
        &self.settings_url
    }

    /// Sink shared by every component built on these credentials
    pub fn diagnostics(&self) -> &Arc<dyn Diagnostics> {
        &self.diagnostics
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("api_key", &self.api_key.as_ref().map(|_| "<REDACTED>"))
            .field("email", &self.email)
            .field("settings_url", &self.settings_url)
            .finish_non_exhaustive()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
