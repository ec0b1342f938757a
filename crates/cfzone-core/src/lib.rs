// # cfzone-core
//
// Core library for managing a CDN zone through the vendor's admin API.
//
// ## Architecture Overview
//
// - **ZoneApi**: Trait for the vendor's zone endpoints (list, read, update)
// - **ConfigStore**: Trait for the persisted settings (`apikey`, `email`, `zone`)
// - **RateState**: Trait for the vendor rate limit counters
// - **Diagnostics**: Trait for operator-facing error reports
// - **CredentialStore**: Credentials loaded once at startup, plus the selected zone
// - **ZoneDirectoryResolver**: Finds the zone to manage, persisting single-zone discoveries
// - **ZoneSettingsClient**: Credential-gated zone settings read/update
// - **SettingsForm**: Validation and submission of the credentials form
// - **ZoneApiRegistry**: Plugin-based registry for vendor clients
//
// ## Design Principles
//
// 1. **Explicit wiring**: every component receives its collaborators as `Arc`s
// 2. **Absence is not failure**: missing credentials or zone yield `Ok(None)`
//    plus a diagnostic; vendor failures are returned to the caller
// 3. **No hidden retries**: one vendor call per operation
// 4. **Library-First**: the CLI is a thin shell over this crate

pub mod admin;
pub mod config;
pub mod credentials;
pub mod error;
pub mod rate;
pub mod registry;
pub mod resolver;
pub mod store;
pub mod traits;
pub mod zone;

// Re-export core types for convenience
pub use admin::{FieldError, SettingsForm, SubmitOutcome};
pub use config::{CoreConfig, ProviderConfig, RateLimits};
pub use credentials::{CredentialStore, Credentials};
pub use error::{Error, Result};
pub use rate::{FileRateState, MemoryRateState};
pub use registry::ZoneApiRegistry;
pub use resolver::{ResolutionState, ZoneDirectoryResolver};
pub use store::{FileConfigStore, MemoryConfigStore};
pub use traits::{ConfigStore, Diagnostics, RateState, ZoneApi};
pub use zone::ZoneSettingsClient;
