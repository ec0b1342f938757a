// # Rate State Implementations
//
// This module provides implementations of the RateState trait.
//
// Both backends share the rollover and limit-warning logic below; they only
// differ in whether counters survive a restart.

pub mod clock;
pub mod file;
pub mod memory;

pub use clock::{Clock, ManualClock, SystemClock};
pub use file::FileRateState;
pub use memory::MemoryRateState;

use chrono::{DateTime, Utc};

use crate::config::RateLimits;
use crate::traits::RateCounters;

/// Count one API call at `now`
pub(crate) fn count_api_call(
    counters: &mut RateCounters,
    limits: &RateLimits,
    now: DateTime<Utc>,
) -> u64 {
    counters.roll(now, limits.window());
    counters.api_call_count_in_window += 1;

    let count = counters.api_call_count_in_window;
    if count == limits.api_calls_per_window {
        tracing::warn!(
            "API rate limit reached: {} calls since {} (limit {} per {}s)",
            count,
            counters.window_start,
            limits.api_calls_per_window,
            limits.window_secs
        );
    }
    count
}

/// Count one tag purge at `now`
pub(crate) fn count_tag_purge(
    counters: &mut RateCounters,
    limits: &RateLimits,
    now: DateTime<Utc>,
) -> u64 {
    counters.roll(now, limits.window());
    counters.tag_purge_count_today += 1;

    let count = counters.tag_purge_count_today;
    if count == limits.tag_purges_per_day {
        tracing::warn!(
            "Daily tag purge limit reached: {} purges on {} (limit {})",
            count,
            counters.tag_purge_day,
            limits.tag_purges_per_day
        );
    }
    count
}
