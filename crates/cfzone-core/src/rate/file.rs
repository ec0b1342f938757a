// # File Rate State
//
// JSON-file backed implementation of RateState.
//
// Short-lived hosts (a CLI invoked per operation) would otherwise start every
// run with empty counters. Increments are written through immediately using
// the same atomic write/backup scheme as the settings file.
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "counters": {
//     "tag_purge_count_today": 12,
//     "tag_purge_day": "2025-01-09",
//     "api_call_count_in_window": 3,
//     "window_start": "2025-01-09T12:00:00Z"
//   }
// }
// ```

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

use super::{Clock, SystemClock, count_api_call, count_tag_purge};
use crate::Error;
use crate::config::RateLimits;
use crate::store::file::{
    FILE_FORMAT_VERSION, ensure_parent_dir, load_json_with_recovery, write_json_atomic,
};
use crate::traits::{RateCounters, RateState};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct RateFileFormat {
    version: String,
    #[serde(default)]
    counters: Option<RateCounters>,
}

/// Rate counters persisted to a JSON file
pub struct FileRateState {
    path: PathBuf,
    counters: Mutex<RateCounters>,
    limits: RateLimits,
    clock: Arc<dyn Clock>,
}

impl FileRateState {
    /// Create or load file-backed counters driven by the wall clock
    pub async fn new<P: AsRef<Path>>(path: P, limits: RateLimits) -> Result<Self, Error> {
        Self::with_clock(path, limits, Arc::new(SystemClock)).await
    }

    /// Create or load file-backed counters driven by a custom clock
    pub async fn with_clock<P: AsRef<Path>>(
        path: P,
        limits: RateLimits,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        ensure_parent_dir(&path).await?;

        let file: RateFileFormat = load_json_with_recovery(&path).await?;
        let counters = file
            .counters
            .unwrap_or_else(|| RateCounters::new(clock.now()));

        Ok(Self {
            path,
            counters: Mutex::new(counters),
            limits,
            clock,
        })
    }

    async fn persist(&self, counters: &RateCounters) -> Result<(), Error> {
        let file = RateFileFormat {
            version: FILE_FORMAT_VERSION.to_string(),
            counters: Some(counters.clone()),
        };
        write_json_atomic(&self.path, &file).await
    }
}

impl std::fmt::Debug for FileRateState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileRateState")
            .field("path", &self.path)
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl RateState for FileRateState {
    async fn increment_tag_purge_daily_count(&self) -> Result<u64, Error> {
        let mut guard = self.counters.lock().await;
        let count = count_tag_purge(&mut guard, &self.limits, self.clock.now());
        self.persist(&guard).await?;
        Ok(count)
    }

    async fn get_tag_daily_count(&self) -> Result<u64, Error> {
        Ok(self.snapshot().await?.tag_purge_count_today)
    }

    async fn increment_api_rate_count(&self) -> Result<u64, Error> {
        let mut guard = self.counters.lock().await;
        let count = count_api_call(&mut guard, &self.limits, self.clock.now());
        self.persist(&guard).await?;
        Ok(count)
    }

    async fn get_api_rate_count(&self) -> Result<u64, Error> {
        Ok(self.snapshot().await?.api_call_count_in_window)
    }

    async fn snapshot(&self) -> Result<RateCounters, Error> {
        let mut guard = self.counters.lock().await;
        guard.roll(self.clock.now(), self.limits.window());
        Ok(guard.clone())
    }
}
