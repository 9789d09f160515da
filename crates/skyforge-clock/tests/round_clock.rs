//! Integration tests for the round clock.
//!
//! Uses tokio's paused clock so `sleep_until` resolves as soon as the
//! runtime auto-advances time.

use std::time::Duration;

use skyforge_clock::{ClockConfig, MissedTickPolicy, RoundClock};

// =========================================================================
// Helpers
// =========================================================================

fn every_second() -> ClockConfig {
    ClockConfig {
        initial_jitter_us: 0,
        ..ClockConfig::every_second()
    }
}

// =========================================================================
// ClockConfig
// =========================================================================

#[test]
fn test_default_period_is_one_second() {
    let cfg = ClockConfig::default();
    assert_eq!(cfg.host_tick_rate, 20);
    assert_eq!(cfg.interval_ticks, 20);
    assert_eq!(cfg.period(), Some(Duration::from_secs(1)));
}

#[test]
fn test_interval_scales_period() {
    let cfg = ClockConfig {
        interval_ticks: 10,
        ..ClockConfig::default()
    };
    assert_eq!(cfg.period(), Some(Duration::from_millis(500)));
}

#[test]
fn test_with_period_keeps_millisecond_precision() {
    let cfg = ClockConfig::with_period(Duration::from_millis(50));
    assert_eq!(cfg.period(), Some(Duration::from_millis(50)));
}

#[test]
fn test_detached_has_no_period() {
    assert_eq!(ClockConfig::detached().period(), None);
}

#[test]
fn test_validated_repairs_zero_rate() {
    let cfg = ClockConfig {
        host_tick_rate: 0,
        ..ClockConfig::default()
    }
    .validated();
    assert_eq!(cfg.host_tick_rate, 20);
}

#[test]
fn test_validated_clamps_rate_and_threshold() {
    let cfg = ClockConfig {
        host_tick_rate: 50_000,
        budget_warn_threshold: 3.0,
        ..ClockConfig::default()
    }
    .validated();
    assert_eq!(cfg.host_tick_rate, ClockConfig::MAX_HOST_TICK_RATE);
    assert_eq!(cfg.budget_warn_threshold, 1.0);
}

// =========================================================================
// Clock accessors
// =========================================================================

#[test]
fn test_clock_initial_state() {
    let clock = RoundClock::new(every_second());
    assert_eq!(clock.ticks(), 0);
    assert!(!clock.is_detached());
    assert!(!clock.is_paused());
    assert_eq!(clock.period(), Some(Duration::from_secs(1)));
}

#[test]
fn test_detached_clock() {
    let clock = RoundClock::new(ClockConfig::detached());
    assert!(clock.is_detached());
    assert_eq!(clock.period(), None);
}

// =========================================================================
// Firing
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_next_tick_fires_and_counts() {
    let mut clock = RoundClock::new(every_second());

    let tick = clock.next_tick().await;
    assert_eq!(tick.seq, 1);
    assert_eq!(tick.period, Duration::from_secs(1));
    assert!(!tick.late);
    assert_eq!(tick.missed, 0);
    assert_eq!(clock.ticks(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_ticks_are_one_period_apart() {
    let mut clock = RoundClock::new(every_second());
    let start = tokio::time::Instant::now();

    for expected in 1..=5 {
        let tick = clock.next_tick().await;
        assert_eq!(tick.seq, expected);
    }
    assert_eq!(start.elapsed(), Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn test_detached_clock_never_fires() {
    let mut clock = RoundClock::new(ClockConfig::detached());
    let result = tokio::time::timeout(Duration::from_secs(30), clock.next_tick()).await;
    assert!(result.is_err(), "detached clock should pend forever");
}

// =========================================================================
// Pause / resume
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_pause_stops_ticks() {
    let mut clock = RoundClock::new(every_second());
    clock.next_tick().await;

    clock.pause();
    assert!(clock.is_paused());

    let result = tokio::time::timeout(Duration::from_secs(10), clock.next_tick()).await;
    assert!(result.is_err(), "paused clock should pend");
}

#[tokio::test(start_paused = true)]
async fn test_resume_continues_sequence() {
    let mut clock = RoundClock::new(every_second());
    clock.next_tick().await;
    clock.pause();
    clock.resume();
    assert!(!clock.is_paused());

    let tick = clock.next_tick().await;
    assert_eq!(tick.seq, 2);
}

#[test]
fn test_pause_resume_idempotent() {
    let mut clock = RoundClock::new(every_second());
    clock.pause();
    clock.pause();
    assert!(clock.is_paused());
    clock.resume();
    clock.resume();
    assert!(!clock.is_paused());
}

// =========================================================================
// Metrics
// =========================================================================

#[test]
fn test_initial_metrics_are_zero() {
    let clock = RoundClock::new(every_second());
    let m = clock.metrics();
    assert_eq!(m.total_ticks, 0);
    assert_eq!(m.late_ticks, 0);
    assert_eq!(m.missed_ticks, 0);
    assert_eq!(m.max_work, Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_record_tick_end_without_tick_is_noop() {
    let mut clock = RoundClock::new(every_second());
    clock.record_tick_end();
    assert_eq!(clock.metrics().total_ticks, 0);
    assert_eq!(clock.metrics().max_work, Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_work_time_is_measured() {
    let mut clock = RoundClock::new(every_second());
    clock.next_tick().await;
    // Work time is wall-clock (std Instant), so burn a little real time.
    std::thread::sleep(Duration::from_micros(50));
    clock.record_tick_end();

    assert_eq!(clock.metrics().total_ticks, 1);
    assert!(clock.metrics().max_work > Duration::ZERO);
    assert!(clock.metrics().budget_utilization < 1.0);
}

#[tokio::test(start_paused = true)]
async fn test_metrics_disabled_skips_work_stats() {
    let mut clock = RoundClock::new(ClockConfig {
        metrics_enabled: false,
        ..every_second()
    });
    clock.next_tick().await;
    std::thread::sleep(Duration::from_micros(50));
    clock.record_tick_end();

    assert_eq!(clock.metrics().avg_work, Duration::ZERO);
    assert_eq!(clock.metrics().max_work, Duration::ZERO);
}

// =========================================================================
// Missed-tick policies
// =========================================================================

#[test]
fn test_default_policy_is_skip() {
    assert_eq!(ClockConfig::default().policy, MissedTickPolicy::Skip);
}

#[tokio::test(start_paused = true)]
async fn test_burst_policy_on_time_tick() {
    let mut clock = RoundClock::new(ClockConfig {
        policy: MissedTickPolicy::Burst { max_burst: 3 },
        ..every_second()
    });
    let tick = clock.next_tick().await;
    assert!(!tick.late);
    assert_eq!(tick.missed, 0);
}

#[tokio::test(start_paused = true)]
async fn test_skip_policy_reports_missed_ticks_after_stall() {
    let mut clock = RoundClock::new(every_second());
    clock.next_tick().await;

    // Due at 2s; poll at 5.5s, three whole periods behind.
    tokio::time::advance(Duration::from_millis(4_500)).await;
    let tick = clock.next_tick().await;
    assert!(tick.late);
    assert_eq!(tick.missed, 3);
    assert_eq!(clock.metrics().late_ticks, 1);
}

// =========================================================================
// select! loop (mirrors the arena runtime)
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_select_loop_pattern() {
    let mut clock = RoundClock::new(every_second());
    let (tx, mut rx) = tokio::sync::mpsc::channel::<&str>(4);

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(3_500)).await;
        tx.send("stop").await.ok();
    });

    let mut fired = 0u64;
    loop {
        tokio::select! {
            Some(cmd) = rx.recv() => {
                assert_eq!(cmd, "stop");
                break;
            }
            tick = clock.next_tick() => {
                fired += 1;
                clock.record_tick_end();
                assert_eq!(tick.seq, fired);
            }
        }
    }

    assert_eq!(fired, 3);
}
