//! Configuration types for cfzone
//!
//! This module defines the runtime configuration and the key names used in
//! the persisted settings store.

use serde::{Deserialize, Serialize};

/// Settings key holding the vendor API key
pub const KEY_API_KEY: &str = "apikey";

/// Settings key holding the account email
pub const KEY_EMAIL: &str = "email";

/// Settings key holding the selected zone id
pub const KEY_ZONE: &str = "zone";

/// Default location of the administrative settings screen
pub const DEFAULT_SETTINGS_URL: &str = "/admin/config/services/cloudflare";

/// Main cfzone configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Where operators fix credentials and zone selection.
    /// Every diagnostic links here.
    #[serde(default = "default_settings_url")]
    pub settings_url: String,

    /// Vendor rate limits used to warn before they are hit
    #[serde(default)]
    pub rate_limits: RateLimits,

    /// Vendor provider selection
    #[serde(default)]
    pub provider: ProviderConfig,
}

impl CoreConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self {
            settings_url: default_settings_url(),
            rate_limits: RateLimits::default(),
            provider: ProviderConfig::default(),
        }
    }

    /// Set the settings location used in diagnostics
    pub fn with_settings_url(mut self, url: impl Into<String>) -> Self {
        self.settings_url = url.into();
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.settings_url.is_empty() {
            return Err(crate::Error::config("Settings URL cannot be empty"));
        }

        self.rate_limits.validate()?;
        self.provider.validate()
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Vendor-imposed API limits
///
/// Cloudflare allows 1200 requests per 5 minutes per user and 2000 cache-tag
/// purges per day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimits {
    /// Maximum API calls per rate window
    #[serde(default = "default_api_calls_per_window")]
    pub api_calls_per_window: u64,

    /// Length of the API rate window (in seconds)
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// Maximum tag purges per UTC day
    #[serde(default = "default_tag_purges_per_day")]
    pub tag_purges_per_day: u64,
}

impl RateLimits {
    /// Length of the API rate window
    pub fn window(&self) -> chrono::Duration {
        i64::try_from(self.window_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX)
    }

    /// Validate the limits
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.window_secs == 0 {
            return Err(crate::Error::config("Rate window must be > 0"));
        }
        if self.api_calls_per_window == 0 {
            return Err(crate::Error::config("API call limit must be > 0"));
        }
        if self.tag_purges_per_day == 0 {
            return Err(crate::Error::config("Tag purge limit must be > 0"));
        }
        Ok(())
    }
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            api_calls_per_window: default_api_calls_per_window(),
            window_secs: default_window_secs(),
            tag_purges_per_day: default_tag_purges_per_day(),
        }
    }
}

/// Vendor provider configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Registered provider name
    #[serde(default = "default_provider_kind")]
    pub kind: String,

    /// Override of the vendor API base URL (testing, proxies)
    #[serde(default)]
    pub api_base: Option<String>,

    /// HTTP request timeout (in seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProviderConfig {
    /// Create a provider configuration for a registered provider name
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Self::default()
        }
    }

    /// Override the API base URL
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.kind.is_empty() {
            return Err(crate::Error::config("Provider kind cannot be empty"));
        }
        if self.timeout_secs == 0 {
            return Err(crate::Error::config("Provider timeout must be > 0"));
        }
        if let Some(ref base) = self.api_base
            && !base.starts_with("https://")
            && !base.starts_with("http://")
        {
            return Err(crate::Error::config(format!(
                "Provider API base must use HTTP or HTTPS scheme. Got: {}",
                base
            )));
        }
        Ok(())
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: default_provider_kind(),
            api_base: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_provider_kind() -> String {
    "cloudflare".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_settings_url() -> String {
    DEFAULT_SETTINGS_URL.to_string()
}

fn default_api_calls_per_window() -> u64 {
    1200
}

fn default_window_secs() -> u64 {
    300
}

fn default_tag_purges_per_day() -> u64 {
    2000
}
