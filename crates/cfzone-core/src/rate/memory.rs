// # Memory Rate State
//
// In-memory implementation of RateState. Counters are lost on restart, which
// is fine for long-running hosts: the vendor window is only five minutes.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::{Clock, SystemClock, count_api_call, count_tag_purge};
use crate::Error;
use crate::config::RateLimits;
use crate::traits::{RateCounters, RateState};

/// In-memory rate counters guarded by a mutex
pub struct MemoryRateState {
    counters: Mutex<RateCounters>,
    limits: RateLimits,
    clock: Arc<dyn Clock>,
}

impl MemoryRateState {
    /// Create counters driven by the wall clock
    pub fn new(limits: RateLimits) -> Self {
        Self::with_clock(limits, Arc::new(SystemClock))
    }

    /// Create counters driven by a custom clock
    pub fn with_clock(limits: RateLimits, clock: Arc<dyn Clock>) -> Self {
        let counters = RateCounters::new(clock.now());
        Self {
            counters: Mutex::new(counters),
            limits,
            clock,
        }
    }
}

impl Default for MemoryRateState {
    fn default() -> Self {
        Self::new(RateLimits::default())
    }
}

impl std::fmt::Debug for MemoryRateState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryRateState")
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl RateState for MemoryRateState {
    async fn increment_tag_purge_daily_count(&self) -> Result<u64, Error> {
        let mut guard = self.counters.lock().await;
        Ok(count_tag_purge(&mut guard, &self.limits, self.clock.now()))
    }

    async fn get_tag_daily_count(&self) -> Result<u64, Error> {
        Ok(self.snapshot().await?.tag_purge_count_today)
    }

    async fn increment_api_rate_count(&self) -> Result<u64, Error> {
        let mut guard = self.counters.lock().await;
        Ok(count_api_call(&mut guard, &self.limits, self.clock.now()))
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
