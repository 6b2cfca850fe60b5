//! Drift-correcting periodic scheduler.
//!
//! Each firing is anchored to an absolute expected deadline rather than to
//! the moment the previous callback finished, so per-tick latency does not
//! accumulate. After a stall longer than one interval the deadline is walked
//! forward past `now` and the missed ticks are dropped instead of replayed.
//!
//! The scheduler knows nothing about what a tick does. The owner polls
//! [`DriftScheduler::take_due`], runs its tick, then hands the handle back
//! through [`DriftScheduler::complete`] to arm the next firing. If the tick
//! cancelled or restarted the scheduler in the meantime, the handle is stale
//! and `complete` does nothing.

use std::time::{Duration, Instant};

use crate::timer::{OneShot, TimerHandle};

const MIN_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Default)]
pub struct DriftScheduler {
    interval: Duration,
    expected: Option<Instant>,
    timer: OneShot,
    in_flight: Option<TimerHandle>,
    skipped: u64,
}

impl DriftScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the first firing one interval from `now`. Replaces any earlier run.
    pub fn start(&mut self, interval: Duration, now: Instant) -> TimerHandle {
        self.cancel();
        self.interval = interval.max(MIN_INTERVAL);
        let deadline = now + self.interval;
        self.expected = Some(deadline);
        self.timer.arm(deadline)
    }

    /// Cancel and start over with a fresh deadline.
    pub fn restart(&mut self, interval: Duration, now: Instant) -> TimerHandle {
        log::debug!(target: "scheduler", "restart with interval {:?}", interval);
        self.start(interval, now)
    }

    /// Drop the pending firing and any tick in flight. Idempotent.
    pub fn cancel(&mut self) {
        self.timer.cancel();
        self.in_flight = None;
        self.expected = None;
    }

    pub fn is_armed(&self) -> bool {
        self.timer.is_armed() || self.in_flight.is_some()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn next_fire_at(&self) -> Option<Instant> {
        self.timer.fire_at()
    }

    /// Ticks dropped by stall recovery since the scheduler was created.
    pub fn skipped_ticks(&self) -> u64 {
        self.skipped
    }

    /// Returns the handle of a firing whose time has come. The caller must
    /// run its tick and then pass the handle to `complete`.
    pub fn take_due(&mut self, now: Instant) -> Option<TimerHandle> {
        let handle = self.timer.take_due(now)?;
        self.in_flight = Some(handle);
        Some(handle)
    }

    /// Arm the next firing after a tick has run. Returns the delay until that
    /// firing, or `None` when `handle` no longer belongs to this run.
    pub fn complete(&mut self, handle: TimerHandle, now: Instant) -> Option<Duration> {
        if self.in_flight != Some(handle) {
            return None;
        }
        self.in_flight = None;
        let mut expected = self.expected?;

        let drift = now.saturating_duration_since(expected);
        if drift > self.interval {
            let mut dropped = 0u64;
            while expected <= now {
                expected += self.interval;
                dropped += 1;
            }
            // The first advance is the regular step; the rest were missed.
            let missed = dropped.saturating_sub(1);
            self.skipped += missed;
            log::debug!(
                target: "scheduler",
                "stalled {:?}, skipping {} tick(s)",
                drift,
                missed
            );
        } else {
            expected += self.interval;
        }

        self.expected = Some(expected);
        let delay = expected.saturating_duration_since(now);
        self.timer.arm(now + delay);
        Some(delay)
    }
}
