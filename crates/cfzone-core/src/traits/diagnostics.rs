// # Diagnostics Trait
//
// Operator-facing error reports. Every diagnostic names the settings
// location where the problem can be fixed.
//
// The default sink forwards to `tracing`; hosts can inject their own (an
// admin message queue, a test recorder).

use std::fmt;

/// What went wrong, from the operator's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// No API key has been entered
    MissingCredentials,
    /// No zone configured and the account does not have exactly one
    AmbiguousOrMissingZone,
    /// A vendor API call failed
    UpstreamUnavailable,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiagnosticKind::MissingCredentials => "missing_credentials",
            DiagnosticKind::AmbiguousOrMissingZone => "ambiguous_or_missing_zone",
            DiagnosticKind::UpstreamUnavailable => "upstream_unavailable",
        };
        f.write_str(name)
    }
}

/// An error-level report for the operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Category of the problem
    pub kind: DiagnosticKind,
    /// Human-readable message
    pub message: String,
    /// Where to fix it
    pub settings_url: String,
}

impl Diagnostic {
    /// No credentials entered
    pub fn missing_credentials(settings_url: &str) -> Self {
        Self {
            kind: DiagnosticKind::MissingCredentials,
            message: format!(
                "No valid credentials have been entered for CloudFlare. Please go to {} to set them.",
                settings_url
            ),
            settings_url: settings_url.to_string(),
        }
    }

    /// No default zone
    pub fn ambiguous_zone(settings_url: &str) -> Self {
        Self {
            kind: DiagnosticKind::AmbiguousOrMissingZone,
            message: format!(
                "No default zone has been entered for CloudFlare. Please go to {} to set.",
                settings_url
            ),
            settings_url: settings_url.to_string(),
        }
    }

    /// Vendor failure, carrying the vendor's message
    pub fn upstream(settings_url: &str, message: impl Into<String>) -> Self {
        Self {
            kind: DiagnosticKind::UpstreamUnavailable,
            message: message.into(),
            settings_url: settings_url.to_string(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Sink for operator diagnostics
pub trait Diagnostics: Send + Sync {
    /// Record an error-level diagnostic
    fn report(&self, diagnostic: Diagnostic);
}

/// Diagnostics sink that logs through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn report(&self, diagnostic: Diagnostic) {
        tracing::error!(
            kind = %diagnostic.kind,
            settings = %diagnostic.settings_url,
            "{}",
            diagnostic.message
        );
    }
}
