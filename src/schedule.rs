//! The run loop and its time-of-day window.
//!
//! The loop is a three-state machine: wait for the allowed window, run one
//! reconciliation pass, sleep the configured interval, repeat forever. The
//! window decides *when a pass is allowed*; the interval decides *how often
//! attempts happen*. A failed pass is logged at the pass boundary and never
//! stops the loop.

use crate::pass;
use async_trait::async_trait;
use imagesync_config::Config;
use std::time::Duration;
use time::{OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

/// Time-of-day range `[start, end)`, in whole hours, during which passes may
/// run.
#[derive(Clone, Copy, Debug)]
pub struct Window {
    start_hour: u8,
    end_hour: u8,
}

impl Window {
    /// Hours are assumed validated (`start < end <= 24`) by the config crate.
    pub fn new(start_hour: u8, end_hour: u8) -> Self {
        Self { start_hour, end_hour }
    }

    pub fn contains(&self, now: OffsetDateTime) -> bool {
        (self.start_hour..self.end_hour).contains(&now.hour())
    }

    /// How long to wait, from `now`, until the window is next open. Zero when
    /// already inside it.
    ///
    /// Before the window on the same day, the wait lands on today's start
    /// hour; at or past the end hour, it rolls to tomorrow's.
    pub fn wait_duration(&self, now: OffsetDateTime) -> Duration {
        if self.contains(now) {
            return Duration::ZERO;
        }
        let opens_on = if now.hour() < self.start_hour {
            now.date()
        } else {
            // next_day is None only at Date::MAX; running then, just go now.
            match now.date().next_day() {
                Some(date) => date,
                None => return Duration::ZERO,
            }
        };
        let start = Time::from_hms(self.start_hour, 0, 0).unwrap_or(Time::MIDNIGHT);
        let opens_at = PrimitiveDateTime::new(opens_on, start).assume_offset(now.offset());
        (opens_at - now).try_into().unwrap_or(Duration::ZERO)
    }
}

/// Time source and suspension capability, injected so the window logic and
/// the loop are testable without sleeping through a real night.
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
    async fn sleep(&self, duration: Duration);
}

/// Wall-clock time at the configured offset, suspending on the tokio timer.
pub struct SystemClock {
    offset: UtcOffset,
}
impl SystemClock {
    pub fn new(offset: UtcOffset) -> Self {
        Self { offset }
    }
}
#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc().to_offset(self.offset)
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Drive reconciliation passes until the process is killed.
pub async fn run(config: &Config, clock: &dyn Clock) {
    let schedule = &config.schedule;
    let window = Window::new(schedule.window_start_hour, schedule.window_end_hour);
    let interval = config.interval();
    loop {
        cycle(config, clock, window, interval).await;
    }
}

/// One turn of the state machine: window wait, pass, interval sleep.
///
/// Always returns normally. A failed pass is logged with its cause chain and
/// still falls through to the interval sleep, which is what keeps one bad
/// cycle from ever taking the service down.
async fn cycle(config: &Config, clock: &dyn Clock, window: Window, interval: Duration) {
    let wait = window.wait_duration(clock.now());
    if !wait.is_zero() {
        tracing::info!(seconds = wait.as_secs(), "outside the allowed window; waiting for it to open");
        clock.sleep(wait).await;
    }

    match pass::run_pass(config).await {
        Ok(report) => tracing::info!(
            raw = report.raw,
            unique = report.unique,
            synced = report.synced.is_some(),
            "reconciliation pass finished"
        ),
        // The pass boundary: every failure ends up here, logged with its
        // cause chain, and the service lives on.
        Err(err) => tracing::error!(error = ?err, "reconciliation pass failed"),
    }

    tracing::info!(seconds = interval.as_secs(), "sleeping until the next attempt");
    clock.sleep(interval).await;
}
