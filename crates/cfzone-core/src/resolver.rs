//! Zone resolution
//!
//! Most accounts have a single zone, which can be assumed as the default.
//! Accounts with several zones must pick one on the settings screen.
//!
//! ```text
//! Uninitialized ──(no API key)──────────────▶ Blocked
//! Uninitialized ──(zone in settings)─────────▶ Resolved
//! Uninitialized ──(one zone at vendor)───────▶ Resolved (+ persisted when the store allows)
//! Uninitialized ──(zero / several zones)─────▶ Ambiguous (terminal, reported)
//! ```
//!
//! Blocked is re-checked on every call. A failed listing leaves the resolver
//! Uninitialized so a later call can try again.

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::credentials::CredentialStore;
use crate::error::{Error, Result};
use crate::traits::{Diagnostic, RateState, Zone, ZoneApi};

/// Where zone resolution currently stands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionState {
    /// Nothing attempted yet, or the last listing failed
    Uninitialized,
    /// No valid credentials
    Blocked,
    /// Zone known
    Resolved(String),
    /// The vendor returned zero or several zones; an operator must choose
    Ambiguous {
        /// Number of zones the vendor returned
        count: usize,
    },
}

/// Determines the single zone this installation manages
pub struct ZoneDirectoryResolver {
    credentials: Arc<CredentialStore>,
    api: Arc<dyn ZoneApi>,
    rate_state: Arc<dyn RateState>,
    state: Mutex<ResolutionState>,
}

impl ZoneDirectoryResolver {
    /// Create a resolver
    pub fn new(
        credentials: Arc<CredentialStore>,
        api: Arc<dyn ZoneApi>,
        rate_state: Arc<dyn RateState>,
    ) -> Self {
        Self {
            credentials,
            api,
            rate_state,
            state: Mutex::new(ResolutionState::Uninitialized),
        }
    }

    /// Current resolution state
    pub async fn state(&self) -> ResolutionState {
        self.state.lock().await.clone()
    }

    /// Resolve the zone id, reporting rather than returning failures
    ///
    /// # Returns
    ///
    /// - `Some(zone_id)`: configured, or discovered and persisted
    /// - `None`: no credentials, no unique zone, or the vendor call failed;
    ///   a diagnostic has been reported
    pub async fn resolve_zone_id(&self) -> Option<String> {
        match self.try_resolve_zone_id().await {
            Ok(zone_id) => Some(zone_id),
            Err(e) => {
                tracing::debug!("Zone resolution yielded no zone: {}", e);
                None
            }
        }
    }

    /// Resolve the zone id, returning the typed failure
    ///
    /// Diagnostics are reported exactly as for [`resolve_zone_id`](Self::resolve_zone_id).
    ///
    /// # Errors
    ///
    /// - `MissingCredentials`: no API key; the vendor was not contacted
    /// - `AmbiguousOrMissingZone`: the account has zero or several zones
    /// - `UpstreamUnavailable`: the zone listing failed
    ///
    /// A discovered zone that cannot be persisted is still returned and kept
    /// in memory; the store failure is logged at error level.
    pub async fn try_resolve_zone_id(&self) -> Result<String> {
        let mut state = self.state.lock().await;

        if !self.credentials.has_valid_credentials() {
            *state = ResolutionState::Blocked;
            return Err(Error::missing_credentials("No API key configured"));
        }

        // Multi-zone accounts pick their zone in settings
        if let Some(zone_id) = self.credentials.zone_id().await {
            tracing::debug!("Using configured zone ID");
            *state = ResolutionState::Resolved(zone_id.clone());
            return Ok(zone_id);
        }

        if let ResolutionState::Ambiguous { count } = *state {
            return Err(Error::ambiguous_zone(count));
        }

        let zones = self.fetch_zones().await?;

        if let [zone] = zones.as_slice() {
            if let Err(e) = self.credentials.set_zone_id(&zone.id).await {
                // Served from memory until the next restart
                tracing::error!(
                    "Discovered zone {} but could not save it: {}. Using it for this process only; set it at {}.",
                    zone.id,
                    e,
                    self.credentials.settings_url()
                );
                self.credentials.cache_zone_id(&zone.id).await;
            }
            tracing::info!("Discovered single zone {} ({})", zone.name, zone.id);
            *state = ResolutionState::Resolved(zone.id.clone());
            return Ok(zone.id.clone());
        }

        let count = zones.len();
        self.credentials
            .diagnostics()
            .report(Diagnostic::ambiguous_zone(self.credentials.settings_url()));
        *state = ResolutionState::Ambiguous { count };
        Err(Error::ambiguous_zone(count))
    }

    /// List the account's zones so an operator can pick one
    ///
    /// # Returns
    ///
    /// - `Ok(None)`: no valid credentials; the vendor was not contacted
    /// - `Ok(Some(zones))`: the vendor listing
    /// - `Err(Error)`: the listing failed (already reported)
    pub async fn list_zones(&self) -> Result<Option<Vec<Zone>>> {
        if !self.credentials.has_valid_credentials() {
            return Ok(None);
        }
        self.fetch_zones().await.map(Some)
    }

    async fn fetch_zones(&self) -> Result<Vec<Zone>> {
        let result = self.api.list_zones().await;
        record_api_call(self.rate_state.as_ref()).await;

        result.map_err(|e| {
            self.credentials.diagnostics().report(Diagnostic::upstream(
                self.credentials.settings_url(),
                e.to_string(),
            ));
            match e {
                Error::UpstreamUnavailable { .. } => e,
                other => Error::upstream(self.api.provider_name(), other.to_string()),
            }
        })
    }
}

/// Count a vendor call; counter failures never fail the call itself
pub(crate) async fn record_api_call(rate_state: &dyn RateState) {
    if let Err(e) = rate_state.increment_api_rate_count().await {
        tracing::warn!("Failed to record API call in rate counters: {}", e);
    }
}
