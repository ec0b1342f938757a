// # Rate State Trait
//
// Tracks usage of the vendor API against its published limits.
//
// ## Counters
//
// - Tag purges done today (UTC calendar day)
// - API calls done in the current 5-minute window
//
// Both counters reset themselves when their period rolls over: reads apply
// the rollover, increments apply it and then count.
//
// The API window is fixed, not sliding. It opens at the first call after the
// previous window expired and lasts `window_secs`; calls from the previous
// window never count toward the new one.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot of the rate counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateCounters {
    /// Tag purges counted on `tag_purge_day`
    pub tag_purge_count_today: u64,
    /// Day the purge counter belongs to
    pub tag_purge_day: NaiveDate,
    /// API calls counted since `window_start`
    pub api_call_count_in_window: u64,
    /// Start of the current fixed API rate window
    pub window_start: DateTime<Utc>,
}

impl RateCounters {
    /// Fresh counters anchored at `now`
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            tag_purge_count_today: 0,
            tag_purge_day: now.date_naive(),
            api_call_count_in_window: 0,
            window_start: now,
        }
    }

    /// Reset whichever counters have crossed their period boundary
    ///
    /// Returns `true` if anything was reset.
    pub fn roll(&mut self, now: DateTime<Utc>, window: chrono::Duration) -> bool {
        let mut rolled = false;

        let today = now.date_naive();
        if today != self.tag_purge_day {
            self.tag_purge_day = today;
            self.tag_purge_count_today = 0;
            rolled = true;
        }

        // A clock stepping backwards also opens a new window
        let elapsed = now.signed_duration_since(self.window_start);
        if elapsed >= window || elapsed < chrono::Duration::zero() {
            self.window_start = now;
            self.api_call_count_in_window = 0;
            rolled = true;
        }

        rolled
    }
}

/// Trait for rate counter implementations
///
/// # Thread Safety
///
/// Increments must be atomic with respect to concurrent callers.
#[async_trait]
pub trait RateState: Send + Sync {
    /// Count one tag purge; returns today's count including this one
    async fn increment_tag_purge_daily_count(&self) -> Result<u64, crate::Error>;

    /// Tag purges done today
    async fn get_tag_daily_count(&self) -> Result<u64, crate::Error>;

    /// Count one vendor API call; returns the window's count including this one
    async fn increment_api_rate_count(&self) -> Result<u64, crate::Error>;

    /// API calls done in the current window
    async fn get_api_rate_count(&self) -> Result<u64, crate::Error>;

    /// Full counter snapshot (after rollover)
    async fn snapshot(&self) -> Result<RateCounters, crate::Error>;
}
