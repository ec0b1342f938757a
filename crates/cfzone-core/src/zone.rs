//! Zone settings read/update
//!
//! Both operations are gated on credentials: without an API key they return
//! immediately and never touch the network. Vendor failures are reported
//! once and handed back to the caller unchanged, which decides whether to
//! degrade.

use std::sync::Arc;

use crate::credentials::CredentialStore;
use crate::error::{Error, Result};
use crate::resolver::{ZoneDirectoryResolver, record_api_call};
use crate::traits::{Diagnostic, RateState, ZoneApi, ZoneSettings};

/// Reads and writes zone-level settings through the vendor API
pub struct ZoneSettingsClient {
    credentials: Arc<CredentialStore>,
    resolver: Arc<ZoneDirectoryResolver>,
    api: Arc<dyn ZoneApi>,
    rate_state: Arc<dyn RateState>,
}

impl ZoneSettingsClient {
    /// Create a client
    pub fn new(
        credentials: Arc<CredentialStore>,
        resolver: Arc<ZoneDirectoryResolver>,
        api: Arc<dyn ZoneApi>,
        rate_state: Arc<dyn RateState>,
    ) -> Self {
        Self {
            credentials,
            resolver,
            api,
            rate_state,
        }
    }

    /// Fetch the settings of the resolved zone
    ///
    /// # Returns
    ///
    /// - `Ok(Some(settings))`: exactly what the vendor returned
    /// - `Ok(None)`: no credentials or no zone could be resolved (reported)
    /// - `Err(Error)`: the vendor call failed (reported once)
    pub async fn get_zone_settings(&self) -> Result<Option<ZoneSettings>> {
        if !self.credentials.has_valid_credentials() {
            return Ok(None);
        }

        let Some(zone_id) = self.resolver.resolve_zone_id().await else {
            return Ok(None);
        };

        tracing::debug!("Fetching settings for zone {}", zone_id);
        let result = self.api.get_zone_settings(&zone_id).await;
        record_api_call(self.rate_state.as_ref()).await;

        result.map(Some).map_err(|e| self.report(e))
    }

    /// Push settings to the zone they name
    ///
    /// No-op without credentials.
    ///
    /// # Errors
    ///
    /// - `InvalidInput`: `settings.zone_id` is empty
    /// - any vendor error, reported once and returned unchanged
    pub async fn update_zone_settings(&self, settings: &ZoneSettings) -> Result<()> {
        if !self.credentials.has_valid_credentials() {
            return Ok(());
        }

        if settings.zone_id.is_empty() {
            return Err(Error::invalid_input("Zone settings carry no zone id"));
        }

        tracing::info!(
            "Updating {} setting(s) on zone {}",
            settings.settings.len(),
            settings.zone_id
        );
        let result = self.api.update_zone(settings).await;
        record_api_call(self.rate_state.as_ref()).await;

        result.map_err(|e| self.report(e))
    }

    fn report(&self, error: Error) -> Error {
        self.credentials.diagnostics().report(Diagnostic::upstream(
            self.credentials.settings_url(),
            error.to_string(),
        ));
        error
    }
}
