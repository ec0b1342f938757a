//! Contract Test: Rate Windows
//!
//! Constraints verified:
//! - N increments read back as N within one window
//! - Crossing the window boundary reads 0, then accumulates again
//! - Windows are fixed: calls just before a boundary are not carried over
//! - Tag purges reset at UTC midnight, independently of API calls
//! - File-backed counters survive a restart
//!
//! If this test fails, rate accounting no longer matches the vendor's limits.

use cfzone_core::config::RateLimits;
use cfzone_core::rate::{Clock, ManualClock};
use cfzone_core::traits::RateState;
use cfzone_core::{FileRateState, MemoryRateState};
use chrono::{Duration, TimeZone, Utc};
use std::sync::Arc;

fn clock_at_noon() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
    ))
}

#[tokio::test]
async fn api_count_accumulates_then_resets_at_window_boundary() {
    let clock = clock_at_noon();
    let state = MemoryRateState::with_clock(RateLimits::default(), clock.clone());

    for _ in 0..5 {
        state.increment_api_rate_count().await.unwrap();
    }
    clock.advance(Duration::seconds(299));
    assert_eq!(state.get_api_rate_count().await.unwrap(), 5);

    clock.advance(Duration::seconds(1));
    assert_eq!(state.get_api_rate_count().await.unwrap(), 0);

    assert_eq!(state.increment_api_rate_count().await.unwrap(), 1);
    assert_eq!(state.increment_api_rate_count().await.unwrap(), 2);
    assert_eq!(state.get_api_rate_count().await.unwrap(), 2);
}

#[tokio::test]
async fn new_window_is_anchored_at_first_call_after_expiry() {
    let clock = clock_at_noon();
    let state = MemoryRateState::with_clock(RateLimits::default(), clock.clone());

    state.increment_api_rate_count().await.unwrap();
    clock.advance(Duration::minutes(7));
    state.increment_api_rate_count().await.unwrap();

    let snapshot = state.snapshot().await.unwrap();
    assert_eq!(snapshot.window_start, clock.now());
    assert_eq!(snapshot.api_call_count_in_window, 1);
}

#[tokio::test]
async fn burst_across_boundary_is_split_between_windows() {
    let clock = clock_at_noon();
    let state = MemoryRateState::with_clock(RateLimits::default(), clock.clone());

    state.increment_api_rate_count().await.unwrap();
    clock.advance(Duration::seconds(290));
    for _ in 0..4 {
        state.increment_api_rate_count().await.unwrap();
    }
    assert_eq!(state.get_api_rate_count().await.unwrap(), 5);

    // 20 seconds later the last 300 seconds hold 5 calls, the new window only 1
    clock.advance(Duration::seconds(20));
    assert_eq!(state.increment_api_rate_count().await.unwrap(), 1);
    assert_eq!(
        state.snapshot().await.unwrap().window_start,
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 5, 10).unwrap()
    );
}

#[tokio::test]
async fn tag_purges_reset_at_midnight_only() {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 3, 1, 23, 50, 0).unwrap(),
    ));
    let state = MemoryRateState::with_clock(RateLimits::default(), clock.clone());

    state.increment_tag_purge_daily_count().await.unwrap();
    clock.advance(Duration::minutes(6));
    assert_eq!(state.increment_tag_purge_daily_count().await.unwrap(), 2);
    assert_eq!(state.get_api_rate_count().await.unwrap(), 0);

    clock.advance(Duration::minutes(5));
    assert_eq!(state.get_tag_daily_count().await.unwrap(), 0);
}

#[tokio::test]
async fn limit_is_reported_not_enforced() {
    let limits = RateLimits {
        api_calls_per_window: 2,
        ..RateLimits::default()
    };
    let state = MemoryRateState::with_clock(limits, clock_at_noon());

    for expected in 1..=4 {
        assert_eq!(state.increment_api_rate_count().await.unwrap(), expected);
    }
}

#[tokio::test]
async fn file_counters_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rate.json");
    let clock = clock_at_noon();

    {
        let state = FileRateState::with_clock(&path, RateLimits::default(), clock.clone())
            .await
            .unwrap();
        state.increment_api_rate_count().await.unwrap();
        state.increment_api_rate_count().await.unwrap();
        state.increment_tag_purge_daily_count().await.unwrap();
    }

    clock.advance(Duration::minutes(1));
    let state = FileRateState::with_clock(&path, RateLimits::default(), clock.clone())
        .await
        .unwrap();
    assert_eq!(state.get_api_rate_count().await.unwrap(), 2);
    assert_eq!(state.get_tag_daily_count().await.unwrap(), 1);
}
