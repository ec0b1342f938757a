//! Test doubles and common utilities for contract tests
//!
//! This module provides minimal test doubles that count vendor calls and
//! record diagnostics without any network access.

#![allow(dead_code)]

use cfzone_core::config::CoreConfig;
use cfzone_core::error::{Error, Result};
use cfzone_core::rate::ManualClock;
use cfzone_core::store::MemoryConfigStore;
use cfzone_core::traits::{
    ConfigStore, Diagnostic, DiagnosticKind, Diagnostics, RateState, Zone, ZoneApi, ZoneSetting,
    ZoneSettings,
};
use cfzone_core::{CredentialStore, MemoryRateState, ZoneDirectoryResolver, ZoneSettingsClient};
use chrono::{TimeZone, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A mock ZoneApi that tracks calls
pub struct MockZoneApi {
    /// Zones returned by list_zones()
    zones: Vec<Zone>,
    /// Settings returned by get_zone_settings() for any zone
    settings: Vec<ZoneSetting>,
    /// Message of the error every call fails with, if any
    failure: Option<String>,
    /// Call counter for list_zones()
    list_call_count: Arc<AtomicUsize>,
    /// Call counter for get_zone_settings()
    get_call_count: Arc<AtomicUsize>,
    /// Call counter for update_zone()
    update_call_count: Arc<AtomicUsize>,
    /// Settings received by update_zone()
    updates: Arc<std::sync::Mutex<Vec<ZoneSettings>>>,
}

impl MockZoneApi {
    /// Vendor account owning the given zone ids
    pub fn with_zones(ids: &[&str]) -> Self {
        Self {
            zones: ids
                .iter()
                .map(|id| Zone {
                    id: id.to_string(),
                    name: format!("{}.example.com", id),
                    status: "active".to_string(),
                })
                .collect(),
            settings: vec![
                ZoneSetting {
                    id: "security_level".to_string(),
                    value: serde_json::json!("medium"),
                    editable: true,
                    modified_on: None,
                },
                ZoneSetting {
                    id: "always_online".to_string(),
                    value: serde_json::json!("on"),
                    editable: false,
                    modified_on: None,
                },
            ],
            failure: None,
            list_call_count: Arc::new(AtomicUsize::new(0)),
            get_call_count: Arc::new(AtomicUsize::new(0)),
            update_call_count: Arc::new(AtomicUsize::new(0)),
            updates: Arc::new(std::sync::Mutex::new(Vec::new())),
        }
    }

    /// Make every call fail with `message`
    pub fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    /// Settings the vendor reports for a zone
    pub fn expected_settings(&self, zone_id: &str) -> ZoneSettings {
        ZoneSettings::new(zone_id, self.settings.clone())
    }

    pub fn list_call_count(&self) -> usize {
        self.list_call_count.load(Ordering::SeqCst)
    }

    pub fn get_call_count(&self) -> usize {
        self.get_call_count.load(Ordering::SeqCst)
    }

    pub fn update_call_count(&self) -> usize {
        self.update_call_count.load(Ordering::SeqCst)
    }

    /// Total vendor calls of any kind
    pub fn total_calls(&self) -> usize {
        self.list_call_count() + self.get_call_count() + self.update_call_count()
    }

    pub fn updates(&self) -> Vec<ZoneSettings> {
        self.updates.lock().unwrap().clone()
    }

    /// Create a new MockZoneApi that shares counters with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            zones: other.zones.clone(),
            settings: other.settings.clone(),
            failure: other.failure.clone(),
            list_call_count: Arc::clone(&other.list_call_count),
            get_call_count: Arc::clone(&other.get_call_count),
            update_call_count: Arc::clone(&other.update_call_count),
            updates: Arc::clone(&other.updates),
        }
    }

    fn fail(&self) -> Result<()> {
        match self.failure {
            Some(ref message) => Err(Error::upstream("mock", message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl ZoneApi for MockZoneApi {
    async fn list_zones(&self) -> Result<Vec<Zone>> {
        self.list_call_count.fetch_add(1, Ordering::SeqCst);
        self.fail()?;
        Ok(self.zones.clone())
    }

    async fn get_zone_settings(&self, zone_id: &str) -> Result<ZoneSettings> {
        self.get_call_count.fetch_add(1, Ordering::SeqCst);
        self.fail()?;
        Ok(self.expected_settings(zone_id))
    }

    async fn update_zone(&self, settings: &ZoneSettings) -> Result<()> {
        self.update_call_count.fetch_add(1, Ordering::SeqCst);
        self.fail()?;
        self.updates.lock().unwrap().push(settings.clone());
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Diagnostics sink that keeps everything it is given
#[derive(Default)]
pub struct RecordingDiagnostics {
    reported: std::sync::Mutex<Vec<Diagnostic>>,
}

impl RecordingDiagnostics {
    pub fn all(&self) -> Vec<Diagnostic> {
        self.reported.lock().unwrap().clone()
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.reported
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.kind == kind)
            .count()
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn report(&self, diagnostic: Diagnostic) {
        self.reported.lock().unwrap().push(diagnostic);
    }
}

/// A settings store that can be read but rejects every write
pub struct ReadOnlyConfigStore {
    inner: MemoryConfigStore,
}

impl ReadOnlyConfigStore {
    pub fn new(inner: MemoryConfigStore) -> Self {
        Self { inner }
    }
}

#[async_trait::async_trait]
impl ConfigStore for ReadOnlyConfigStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<()> {
        Err(Error::store("disk full"))
    }

    async fn remove(&self, _key: &str) -> Result<()> {
        Err(Error::store("disk full"))
    }

    async fn all(&self) -> Result<BTreeMap<String, String>> {
        self.inner.all().await
    }
}

/// Everything a contract test needs, wired the way a host would
pub struct Harness {
    pub store: MemoryConfigStore,
    pub diagnostics: Arc<RecordingDiagnostics>,
    pub api: Arc<MockZoneApi>,
    pub rate_state: Arc<MemoryRateState>,
    pub clock: Arc<ManualClock>,
    pub credentials: Arc<CredentialStore>,
    pub resolver: Arc<ZoneDirectoryResolver>,
    pub client: ZoneSettingsClient,
}

impl Harness {
    /// Wire the components over `settings` and `api`
    pub async fn new(settings: &[(&str, &str)], api: MockZoneApi) -> Self {
        let store = MemoryConfigStore::from_pairs(settings.iter().copied());
        Self::wire(store.clone(), Arc::new(store), api).await
    }

    /// Same as `new`, but every settings write fails
    pub async fn with_read_only_store(settings: &[(&str, &str)], api: MockZoneApi) -> Self {
        let store = MemoryConfigStore::from_pairs(settings.iter().copied());
        let read_only = Arc::new(ReadOnlyConfigStore::new(store.clone()));
        Self::wire(store, read_only, api).await
    }

    async fn wire(
        store: MemoryConfigStore,
        config_store: Arc<dyn ConfigStore>,
        api: MockZoneApi,
    ) -> Self {
        let diagnostics = Arc::new(RecordingDiagnostics::default());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        ));
        let rate_state = Arc::new(MemoryRateState::with_clock(
            Default::default(),
            clock.clone(),
        ));

        let credentials = Arc::new(
            CredentialStore::load(
                config_store,
                diagnostics.clone(),
                &CoreConfig::default(),
            )
            .await
            .expect("credentials load from memory store"),
        );

        let api = Arc::new(api);
        let resolver = Arc::new(ZoneDirectoryResolver::new(
            credentials.clone(),
            api.clone(),
            rate_state.clone(),
        ));
        let client = ZoneSettingsClient::new(
            credentials.clone(),
            resolver.clone(),
            api.clone(),
            rate_state.clone(),
        );

        Self {
            store,
            diagnostics,
            api,
            rate_state,
            clock,
            credentials,
            resolver,
            client,
        }
    }

    /// API calls counted in the current window
    pub async fn api_rate_count(&self) -> u64 {
        self.rate_state.get_api_rate_count().await.unwrap()
    }
}
