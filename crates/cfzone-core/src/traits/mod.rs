//! Core traits for cfzone
//!
//! This module defines the abstract interfaces to every external collaborator.
//!
//! - [`ZoneApi`]: The CDN vendor's zone endpoints
//! - [`ConfigStore`]: Persisted settings (credentials, selected zone)
//! - [`RateState`]: Vendor rate limit counters
//! - [`Diagnostics`]: Operator-facing error reports

pub mod config_store;
pub mod diagnostics;
pub mod rate_state;
pub mod zone_api;

pub use config_store::ConfigStore;
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, TracingDiagnostics};
pub use rate_state::{RateCounters, RateState};
pub use zone_api::{Zone, ZoneApi, ZoneApiFactory, ZoneSetting, ZoneSettings};
