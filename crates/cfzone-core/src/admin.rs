//! Administrative settings form
//!
//! Models the two-field credentials form (API key, account email): default
//! values, validation and submission into the settings store. Rendering is up
//! to the host.

use validator::Validate;

use crate::config::{KEY_API_KEY, KEY_EMAIL, KEY_ZONE};
use crate::error::{Error, Result};
use crate::traits::ConfigStore;

/// Submitted values of the credentials form
#[derive(Clone, Validate)]
pub struct SettingsForm {
    /// Vendor API key or API token
    #[validate(length(min = 1, message = "The API key field is required."))]
    pub api_key: String,

    /// Account email; optional for API tokens
    #[validate(email(message = "Invalid Email Address. Please enter a valid email address."))]
    pub email: Option<String>,
}

/// A validation failure on one form field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Form field name
    pub field: String,
    /// Message to show next to the field
    pub message: String,
}

/// What a successful submit changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitOutcome {
    /// A stored zone was dropped because the API key changed
    pub zone_cleared: bool,
}

impl SettingsForm {
    /// Build a form from raw input
    ///
    /// Values are trimmed; a blank email counts as not given.
    pub fn new(api_key: impl AsRef<str>, email: Option<&str>) -> Self {
        Self {
            api_key: api_key.as_ref().trim().to_string(),
            email: email
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(str::to_string),
        }
    }

    /// Form pre-filled with the stored values
    pub async fn from_store(store: &dyn ConfigStore) -> Result<Self> {
        let api_key = store.get(KEY_API_KEY).await?.unwrap_or_default();
        let email = store.get(KEY_EMAIL).await?;
        Ok(Self::new(api_key, email.as_deref()))
    }

    /// Per-field validation errors, sorted by field name
    pub fn errors(&self) -> Vec<FieldError> {
        let Err(errors) = self.validate() else {
            return Vec::new();
        };

        let mut out: Vec<FieldError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| FieldError {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string()),
                })
            })
            .collect();
        out.sort_by(|a, b| a.field.cmp(&b.field));
        out
    }

    /// Validate and persist the form
    ///
    /// A changed API key may belong to a different account, so a stored zone
    /// is removed and will be resolved again.
    ///
    /// # Errors
    ///
    /// - `InvalidInput`: validation failed; nothing was written
    /// - `Store`: the settings store rejected a write
    pub async fn submit(&self, store: &dyn ConfigStore) -> Result<SubmitOutcome> {
        let errors = self.errors();
        if !errors.is_empty() {
            let message = errors
                .iter()
                .map(|e| format!("{}: {}", e.field, e.message))
                .collect::<Vec<_>>()
                .join("; ");
            return Err(Error::invalid_input(message));
        }

        let previous_key = store.get(KEY_API_KEY).await?;
        let key_changed = previous_key.as_deref() != Some(self.api_key.as_str());

        // Key first: a failed key write must leave the old key and zone paired
        store.set(KEY_API_KEY, &self.api_key).await?;

        let zone_cleared = key_changed && store.get(KEY_ZONE).await?.is_some();
        if zone_cleared {
            store.remove(KEY_ZONE).await?;
            tracing::info!("API key changed; cleared the stored zone");
        }

        match self.email {
            Some(ref email) => store.set(KEY_EMAIL, email).await?,
            None => store.remove(KEY_EMAIL).await?,
        }

        tracing::info!("Saved API credentials");
        Ok(SubmitOutcome { zone_cleared })
    }
}

impl std::fmt::Debug for SettingsForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsForm")
            .field("api_key", &"<REDACTED>")
            .field("email", &self.email)
            .finish()
    }
}
