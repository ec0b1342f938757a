// # Zone API Trait
//
// Defines the interface to the CDN vendor's zone endpoints.
//
// ## Implementations
//
// - Cloudflare: `cfzone-provider-cloudflare` crate
//
// ## Usage
//
// ```rust,ignore
// use cfzone_core::ZoneApi;
//
// async fn dump(api: &dyn ZoneApi) -> cfzone_core::Result<()> {
//     for zone in api.list_zones().await? {
//         let settings = api.get_zone_settings(&zone.id).await?;
//         println!("{}: {} settings", zone.name, settings.settings.len());
//     }
//     Ok(())
// }
// ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ProviderConfig;
use crate::credentials::Credentials;

/// A zone as returned by the vendor zone listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    /// Vendor zone identifier
    pub id: String,
    /// Domain the zone manages
    pub name: String,
    /// Vendor status string (e.g. "active", "pending")
    #[serde(default)]
    pub status: String,
}

/// One vendor-defined zone setting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneSetting {
    /// Setting name (e.g. "security_level")
    pub id: String,
    /// Setting value, shape defined by the vendor
    pub value: Value,
    /// Whether the vendor accepts changes to this setting
    #[serde(default = "default_editable")]
    pub editable: bool,
    /// Last modification time reported by the vendor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_on: Option<DateTime<Utc>>,
}

fn default_editable() -> bool {
    true
}

/// The settings bag of a single zone
///
/// This is a pass-through value: cfzone does not interpret the settings, it
/// only carries them between the caller and the vendor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneSettings {
    /// The zone these settings belong to
    pub zone_id: String,
    /// Vendor settings, in vendor order
    pub settings: Vec<ZoneSetting>,
}

impl ZoneSettings {
    /// Create a settings bag for a zone
    pub fn new(zone_id: impl Into<String>, settings: Vec<ZoneSetting>) -> Self {
        Self {
            zone_id: zone_id.into(),
            settings,
        }
    }

    /// Look up a setting by name
    pub fn get(&self, id: &str) -> Option<&ZoneSetting> {
        self.settings.iter().find(|s| s.id == id)
    }

    /// Look up a setting value by name
    pub fn value(&self, id: &str) -> Option<&Value> {
        self.get(id).map(|s| &s.value)
    }

    /// Change a setting value
    ///
    /// Unknown settings are added as editable entries. Settings the vendor
    /// marked read-only are rejected.
    pub fn set(&mut self, id: &str, value: Value) -> Result<(), crate::Error> {
        match self.settings.iter_mut().find(|s| s.id == id) {
            Some(setting) if !setting.editable => Err(crate::Error::invalid_input(format!(
                "Zone setting '{}' is not editable",
                id
            ))),
            Some(setting) => {
                setting.value = value;
                Ok(())
            }
            None => {
                self.settings.push(ZoneSetting {
                    id: id.to_string(),
                    value,
                    editable: true,
                    modified_on: None,
                });
                Ok(())
            }
        }
    }

    /// Settings the vendor accepts changes for
    pub fn editable(&self) -> impl Iterator<Item = &ZoneSetting> {
        self.settings.iter().filter(|s| s.editable)
    }
}

/// Trait for CDN vendor zone API implementations
///
/// Implementations perform one HTTP exchange per call and never retry:
/// failures are returned to the caller, which decides how to degrade.
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait ZoneApi: Send + Sync {
    /// List the zones visible to the configured credentials
    async fn list_zones(&self) -> Result<Vec<Zone>, crate::Error>;

    /// Fetch every setting of a zone
    async fn get_zone_settings(&self, zone_id: &str) -> Result<ZoneSettings, crate::Error>;

    /// Push settings back to the zone named in `settings.zone_id`
    async fn update_zone(&self, settings: &ZoneSettings) -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing zone API clients from credentials
pub trait ZoneApiFactory: Send + Sync {
    /// Create a ZoneApi instance
    ///
    /// # Parameters
    ///
    /// - `credentials`: Account credentials; the API key must be present
    /// - `config`: Provider endpoint options
    fn create(
        &self,
        credentials: &Credentials,
        config: &ProviderConfig,
    ) -> Result<Box<dyn ZoneApi>, crate::Error>;
}
