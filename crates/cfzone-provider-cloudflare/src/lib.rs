// # Cloudflare Zone Provider
//
// This crate provides the Cloudflare implementation of `ZoneApi`.
//
// ## Behaviour
//
// - One HTTP request per trait call, no retries (zone listing takes one per page)
// - HTTP status codes mapped onto `cfzone_core::Error` kinds
// - Cloudflare's own error message is carried in the error
// - Read-only settings are never sent back on update
//
// ## Authentication
//
// - Global API key: `X-Auth-Key` + `X-Auth-Email` (used when an email is set)
// - API token: `Authorization: Bearer <token>` (used otherwise)
//
// The key NEVER appears in logs or Debug output.
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - List Zones: GET `/zones`
// - Zone Settings: GET `/zones/:zone_id/settings`
// - Edit Zone Settings: PATCH `/zones/:zone_id/settings`

use async_trait::async_trait;
use cfzone_core::config::ProviderConfig;
use cfzone_core::traits::{Zone, ZoneApi, ZoneApiFactory, ZoneSetting, ZoneSettings};
use cfzone_core::{Credentials, Error, Result, ZoneApiRegistry};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Cloudflare API base URL
pub const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Zones requested per listing page
const ZONES_PER_PAGE: u32 = 50;

const PROVIDER: &str = "cloudflare";

/// Cloudflare v4 response envelope
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
    #[serde(default)]
    result_info: Option<ResultInfo>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct ResultInfo {
    #[serde(default)]
    total_pages: Option<u32>,
}

/// How requests are authenticated
enum Auth {
    /// Global API key plus account email
    ApiKey { key: String, email: String },
    /// Scoped API token
    Token(String),
}

/// Cloudflare zone API client
///
/// # Security
///
/// The Debug implementation intentionally does NOT expose the API key.
pub struct CloudflareZoneApi {
    /// ⚠️ NEVER log this value
    auth: Auth,

    /// API base URL, without trailing slash
    api_base: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the API key
impl std::fmt::Debug for CloudflareZoneApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let auth = match self.auth {
            Auth::ApiKey { ref email, .. } => format!("api_key(<REDACTED>, {})", email),
            Auth::Token(_) => "token(<REDACTED>)".to_string(),
        };
        f.debug_struct("CloudflareZoneApi")
            .field("auth", &auth)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl CloudflareZoneApi {
    /// Create a new Cloudflare client
    ///
    /// # Errors
    ///
    /// - `MissingCredentials`: the API key is absent or empty
    /// - `Config`: the endpoint options are invalid or the HTTP client
    ///   could not be built
    pub fn new(credentials: &Credentials, config: &ProviderConfig) -> Result<Self> {
        config.validate()?;

        let key = credentials
            .api_key()
            .ok_or_else(|| Error::missing_credentials("Cloudflare API key cannot be empty"))?
            .to_string();

        let auth = match credentials.email.as_deref().filter(|e| !e.is_empty()) {
            Some(email) => Auth::ApiKey {
                key,
                email: email.to_string(),
            },
            None => Auth::Token(key),
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        let api_base = config
            .api_base
            .as_deref()
            .unwrap_or(CLOUDFLARE_API_BASE)
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            auth,
            api_base,
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.auth {
            Auth::ApiKey { ref key, ref email } => request
                .header("X-Auth-Key", key)
                .header("X-Auth-Email", email),
            Auth::Token(ref token) => request.bearer_auth(token),
        }
    }

    /// Send a request and unwrap the `result` of the v4 envelope
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        what: &str,
    ) -> Result<Envelope<T>> {
        let response = self
            .authorize(request)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| Error::upstream(PROVIDER, format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::upstream(PROVIDER, format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            let message = error_message(&body).unwrap_or(body);
            return Err(map_status(status.as_u16(), what, &message));
        }

        let envelope: Envelope<T> = serde_json::from_str(&body)
            .map_err(|e| Error::upstream(PROVIDER, format!("Failed to parse response: {}", e)))?;

        if !envelope.success {
            let message = join_errors(&envelope.errors)
                .unwrap_or_else(|| format!("{} was not successful", what));
            return Err(Error::upstream(PROVIDER, message));
        }

        Ok(envelope)
    }
}

/// Map an HTTP error status onto an error kind
fn map_status(status: u16, what: &str, message: &str) -> Error {
    match status {
        401 | 403 => Error::auth(format!(
            "Invalid API key or insufficient permissions ({}): {}",
            status, message
        )),
        404 => Error::not_found(format!("{}: {}", what, message)),
        429 => Error::rate_limited(format!(
            "Cloudflare API rate limit exceeded ({}): {}",
            status, message
        )),
        500..=599 => Error::upstream(
            PROVIDER,
            format!("Cloudflare server error ({}): {}", status, message),
        ),
        _ => Error::upstream(PROVIDER, format!("{} failed ({}): {}", what, status, message)),
    }
}

/// Cloudflare's error messages from an error response body
fn error_message(body: &str) -> Option<String> {
    let envelope: Envelope<serde_json::Value> = serde_json::from_str(body).ok()?;
    join_errors(&envelope.errors)
}

fn join_errors(errors: &[ApiMessage]) -> Option<String> {
    if errors.is_empty() {
        return None;
    }
    Some(
        errors
            .iter()
            .map(|e| format!("{} ({})", e.message, e.code))
            .collect::<Vec<_>>()
            .join("; "),
    )
}

#[async_trait]
impl ZoneApi for CloudflareZoneApi {
    /// List the zones visible to the credentials, following every page
    ///
    /// ```http
    /// GET /zones?per_page=50&page=1
    /// ```
    async fn list_zones(&self) -> Result<Vec<Zone>> {
        tracing::debug!("Listing Cloudflare zones");

        let mut zones = Vec::new();
        let mut page: u32 = 1;
        loop {
            let request = self
                .client
                .get(self.url("/zones"))
                .query(&[("per_page", ZONES_PER_PAGE), ("page", page)]);
            let envelope: Envelope<Vec<Zone>> = self.send(request, "Zone listing").await?;

            let batch = envelope.result.unwrap_or_default();
            let total_pages = envelope
                .result_info
                .and_then(|i| i.total_pages)
                .unwrap_or(1);
            let empty = batch.is_empty();
            zones.extend(batch);

            if empty || page >= total_pages {
                break;
            }
            page += 1;
        }

        tracing::debug!("Found {} zone(s) over {} page(s)", zones.len(), page);
        Ok(zones)
    }

    /// ```http
    /// GET /zones/:zone_id/settings
    /// ```
    async fn get_zone_settings(&self, zone_id: &str) -> Result<ZoneSettings> {
        tracing::debug!("Fetching Cloudflare settings for zone {}", zone_id);

        let request = self
            .client
            .get(self.url(&format!("/zones/{}/settings", zone_id)));
        let envelope: Envelope<Vec<ZoneSetting>> =
            self.send(request, "Zone settings lookup").await?;

        Ok(ZoneSettings::new(
            zone_id,
            envelope.result.unwrap_or_default(),
        ))
    }

    /// ```http
    /// PATCH /zones/:zone_id/settings
    /// {"items": [{"id": "security_level", "value": "high"}]}
    /// ```
    async fn update_zone(&self, settings: &ZoneSettings) -> Result<()> {
        let items: Vec<serde_json::Value> = settings
            .editable()
            .map(|s| serde_json::json!({ "id": s.id, "value": s.value }))
            .collect();

        if items.is_empty() {
            tracing::debug!("No editable settings for zone {}; nothing sent", settings.zone_id);
            return Ok(());
        }

        tracing::info!(
            "Updating {} Cloudflare setting(s) on zone {}",
            items.len(),
            settings.zone_id
        );

        let request = self
            .client
            .patch(self.url(&format!("/zones/{}/settings", settings.zone_id)))
            .json(&serde_json::json!({ "items": items }));
        let _: Envelope<serde_json::Value> = self.send(request, "Zone settings update").await?;

        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

/// Factory for creating Cloudflare zone API clients
pub struct CloudflareFactory;

impl ZoneApiFactory for CloudflareFactory {
    fn create(
        &self,
        credentials: &Credentials,
        config: &ProviderConfig,
    ) -> Result<Box<dyn ZoneApi>> {
        Ok(Box::new(CloudflareZoneApi::new(credentials, config)?))
    }
}

/// Register the Cloudflare provider with a registry
///
/// # Example
///
/// ```rust
/// use cfzone_core::ZoneApiRegistry;
///
/// let registry = ZoneApiRegistry::new();
/// cfzone_provider_cloudflare::register(&registry);
/// assert!(registry.has_provider("cloudflare"));
/// ```
pub fn register(registry: &ZoneApiRegistry) {
    registry.register_provider(PROVIDER, Box::new(CloudflareFactory));
}
