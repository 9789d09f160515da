//! Round clock for Skyforge arenas.
//!
//! Every time-based rule in an arena (lobby countdown, round timer, restart
//! checkpoints) advances once per clock tick. The host runs its own
//! simulation at a fixed rate (20 Hz for most block-game servers) and the
//! arena scheduler is registered to run every `interval_ticks` host ticks.
//! With the defaults that is once per 20 host ticks, i.e. once per second,
//! which is why countdowns are stored in seconds.
//!
//! # Detached mode
//!
//! When `interval_ticks` is 0 the clock is detached: [`RoundClock::next_tick`]
//! pends forever. Tests and tools that drive arenas by hand use this.
//!
//! # Integration
//!
//! The clock sits inside the arena runtime's `tokio::select!` loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* host events */ }
//!         _ = clock.next_tick() => {
//!             arenas.tick_all();
//!             clock.record_tick_end();
//!         }
//!     }
//! }
//! ```

use std::time::{Duration, Instant};

use rand::Rng;
use tokio::time::{self, Instant as TokioInstant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// What to do when the runtime wakes up late for a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissedTickPolicy {
    /// Forget the missed ticks and schedule the next one a full period from
    /// now. Countdowns lose the missed seconds but never burst.
    #[default]
    Skip,
    /// Fire up to `max_burst` missed ticks back to back so countdowns keep
    /// wall-clock pace after a stall.
    Burst {
        /// Cap on consecutive late ticks.
        max_burst: u32,
    },
    /// Keep the original cadence; the late tick simply fires late.
    Delay,
}

/// Configuration for a [`RoundClock`].
#[derive(Debug, Clone)]
pub struct ClockConfig {
    /// Host simulation rate in Hz.
    pub host_tick_rate: u32,
    /// Host ticks between two arena ticks. 0 = detached.
    pub interval_ticks: u32,
    /// Late-wakeup handling.
    pub policy: MissedTickPolicy,
    /// A warning is logged when one arena tick uses more than this
    /// fraction (0.0 to 1.0) of its period.
    pub budget_warn_threshold: f64,
    /// Collect execution-time metrics.
    pub metrics_enabled: bool,
    /// Random delay (up to this many µs) added to the first tick so clocks created
    /// together don't fire in lockstep.
    pub initial_jitter_us: u64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            host_tick_rate: 20,
            interval_ticks: 20,
            policy: MissedTickPolicy::default(),
            budget_warn_threshold: 0.5,
            metrics_enabled: true,
            initial_jitter_us: 2_000,
        }
    }
}

impl ClockConfig {
    /// Highest host rate accepted (1 kHz, the millisecond resolution used
    /// by [`with_period`](Self::with_period)).
    pub const MAX_HOST_TICK_RATE: u32 = 1_000;

    /// A clock that fires once per second of host time.
    pub fn every_second() -> Self {
        Self::default()
    }

    /// A clock with an explicit wall period, ignoring host tick maths.
    /// Used by demos that run rounds faster than real time.
    pub fn with_period(period: Duration) -> Self {
        let millis = period.as_millis().min(u32::MAX as u128) as u32;
        Self {
            host_tick_rate: Self::MAX_HOST_TICK_RATE,
            interval_ticks: millis,
            ..Default::default()
        }
    }

    /// A clock that never fires.
    pub fn detached() -> Self {
        Self {
            interval_ticks: 0,
            ..Default::default()
        }
    }

    /// Clamp out-of-range values. Called by [`RoundClock::new`].
    ///
    /// - `host_tick_rate` is forced into `1..=MAX_HOST_TICK_RATE`.
    /// - `budget_warn_threshold` is clamped to `0.0..=1.0`.
    pub fn validated(mut self) -> Self {
        if self.host_tick_rate == 0 {
            warn!("host_tick_rate is 0, using 20");
            self.host_tick_rate = 20;
        } else if self.host_tick_rate > Self::MAX_HOST_TICK_RATE {
            warn!(
                rate = self.host_tick_rate,
                max = Self::MAX_HOST_TICK_RATE,
                "host_tick_rate exceeds maximum, clamping"
            );
            self.host_tick_rate = Self::MAX_HOST_TICK_RATE;
        }
        self.budget_warn_threshold = self.budget_warn_threshold.clamp(0.0, 1.0);
        self
    }

    /// Wall-clock time between arena ticks, or `None` when detached.
    pub fn period(&self) -> Option<Duration> {
        if self.interval_ticks == 0 || self.host_tick_rate == 0 {
            None
        } else {
            Some(Duration::from_secs_f64(
                self.interval_ticks as f64 / self.host_tick_rate as f64,
            ))
        }
    }
}

// ---------------------------------------------------------------------------
// Tick info
// ---------------------------------------------------------------------------

/// One firing of the clock, returned by [`RoundClock::next_tick`].
#[derive(Debug, Clone)]
pub struct ClockTick {
    /// Sequence number, starting at 1.
    pub seq: u64,
    /// The fixed period. Arena rules count ticks, not elapsed time.
    pub period: Duration,
    /// `true` if the runtime woke up noticeably late.
    pub late: bool,
    /// Ticks dropped by the [`MissedTickPolicy`].
    pub missed: u64,
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// Runtime metrics. Timing values measure the work reported through
/// [`RoundClock::record_tick_end`].
#[derive(Debug, Clone, Default)]
pub struct ClockMetrics {
    pub total_ticks: u64,
    pub late_ticks: u64,
    pub missed_ticks: u64,
    /// Exponential moving average (α = 0.1) of tick work time.
    pub avg_work: Duration,
    pub max_work: Duration,
    /// Last tick's work as a fraction of the period.
    pub budget_utilization: f64,
}

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Fixed-cadence tick source driving the arena schedulers.
pub struct RoundClock {
    config: ClockConfig,
    period: Option<Duration>,
    seq: u64,
    next_due: Option<TokioInstant>,
    work_started: Option<Instant>,
    paused: bool,
    metrics: ClockMetrics,
}

impl RoundClock {
    pub fn new(config: ClockConfig) -> Self {
        let config = config.validated();
        let period = config.period();

        let next_due = period.map(|p| {
            let jitter = if config.initial_jitter_us > 0 {
                Duration::from_micros(rand::rng().random_range(0..config.initial_jitter_us))
            } else {
                Duration::ZERO
            };
            TokioInstant::now() + p + jitter
        });

        match period {
            Some(p) => debug!(
                period_ms = p.as_secs_f64() * 1000.0,
                interval_ticks = config.interval_ticks,
                policy = ?config.policy,
                "round clock created"
            ),
            None => debug!("round clock created detached"),
        }

        Self {
            config,
            period,
            seq: 0,
            next_due,
            work_started: None,
            paused: false,
            metrics: ClockMetrics::default(),
        }
    }

    /// Waits for the next tick.
    ///
    /// Detached or paused clocks pend forever; `select!` keeps serving its
    /// other branches.
    pub async fn next_tick(&mut self) -> ClockTick {
        let (due, period) = match (self.next_due, self.period) {
            (Some(due), Some(period)) if !self.paused => (due, period),
            _ => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        };

        time::sleep_until(due).await;

        let now = TokioInstant::now();
        self.seq += 1;
        self.work_started = Some(Instant::now());

        let late_by = now.saturating_duration_since(due);
        let late = late_by > period / 10;
        let behind = late_by.as_nanos() as u64 / period.as_nanos().max(1) as u64;
        let mut missed = 0u64;

        self.next_due = Some(match self.config.policy {
            MissedTickPolicy::Skip => {
                if late && behind > 0 {
                    missed = behind;
                    warn!(tick = self.seq, missed, "round clock late, skipping ahead");
                }
                now + period
            }
            MissedTickPolicy::Burst { max_burst } => {
                if late && behind > 0 {
                    missed = behind.saturating_sub(max_burst as u64);
                    warn!(
                        tick = self.seq,
                        behind,
                        bursting = behind.min(max_burst as u64),
                        "round clock late, bursting"
                    );
                }
                if behind <= max_burst as u64 { due + period } else { now + period }
            }
            MissedTickPolicy::Delay => due + period,
        });

        if late {
            self.metrics.late_ticks += 1;
        }
        self.metrics.missed_ticks += missed;
        self.metrics.total_ticks += 1;

        trace!(tick = self.seq, late, "round clock tick");

        ClockTick {
            seq: self.seq,
            period,
            late,
            missed,
        }
    }

    /// Records that the work for the current tick is done.
    ///
    /// Without this call budget warnings and work metrics stay silent.
    pub fn record_tick_end(&mut self) {
        let Some(started) = self.work_started.take() else {
            return;
        };
        let elapsed = started.elapsed();

        if let Some(period) = self.period {
            let utilization = elapsed.as_secs_f64() / period.as_secs_f64();
            self.metrics.budget_utilization = utilization;
            if utilization >= self.config.budget_warn_threshold {
                warn!(
                    tick = self.seq,
                    elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                    utilization_pct = format!("{:.1}", utilization * 100.0),
                    "arena tick is using a large share of its period"
                );
            }
        }

        if self.config.metrics_enabled {
            self.metrics.max_work = self.metrics.max_work.max(elapsed);
            let alpha = 0.1;
            let prev = self.metrics.avg_work.as_secs_f64();
            self.metrics.avg_work =
                Duration::from_secs_f64(prev * (1.0 - alpha) + elapsed.as_secs_f64() * alpha);
        }
    }

    /// Stops firing until [`resume`](Self::resume). Idempotent.
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            debug!(tick = self.seq, "round clock paused");
        }
    }

    /// Resumes a paused clock one full period from now, so the pause does
    /// not turn into a burst of catch-up ticks.
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            if let Some(period) = self.period {
                self.next_due = Some(TokioInstant::now() + period);
            }
            debug!(tick = self.seq, "round clock resumed");
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_detached(&self) -> bool {
        self.period.is_none()
    }

    /// Ticks fired so far.
    pub fn ticks(&self) -> u64 {
        self.seq
    }

    pub fn metrics(&self) -> &ClockMetrics {
        &self.metrics
    }

    pub fn period(&self) -> Option<Duration> {
        self.period
    }
}
