//! Cancellable timer slots for the cooperative control loop.
//!
//! Nothing here sleeps or spawns. The loop polls each slot with the current
//! time and acts on whatever handle comes back. Every arm produces a fresh
//! `TimerHandle`; once a slot is cancelled or re-armed, older handles are
//! inert and can never match again.

use std::time::Instant;

/// Opaque reference to one armed callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

#[derive(Debug, Default)]
struct HandleSeq(u64);

impl HandleSeq {
    fn next(&mut self) -> TimerHandle {
        self.0 += 1;
        TimerHandle(self.0)
    }
}

/// A slot holding at most one pending one-shot deadline.
///
/// Arming while armed replaces the pending deadline.
#[derive(Debug, Default)]
pub struct OneShot {
    seq: HandleSeq,
    armed: Option<(TimerHandle, Instant)>,
}

impl OneShot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&mut self, at: Instant) -> TimerHandle {
        let handle = self.seq.next();
        self.armed = Some((handle, at));
        handle
    }

    /// Returns true if something was pending. Safe to call when idle.
    pub fn cancel(&mut self) -> bool {
        self.armed.take().is_some()
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    pub fn handle(&self) -> Option<TimerHandle> {
        self.armed.map(|(h, _)| h)
    }

    pub fn fire_at(&self) -> Option<Instant> {
        self.armed.map(|(_, at)| at)
    }

    /// Consume the pending deadline if it has passed.
    pub fn take_due(&mut self, now: Instant) -> Option<TimerHandle> {
        match self.armed {
            Some((handle, at)) if at <= now => {
                self.armed = None;
                Some(handle)
            }
            _ => None,
        }
    }
}

/// A per-frame repeating task (the animation-frame analogue).
///
/// While active, `frame()` yields the live handle on every poll.
#[derive(Debug, Default)]
pub struct FrameLoop {
    seq: HandleSeq,
    active: Option<TimerHandle>,
}

impl FrameLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) -> TimerHandle {
        let handle = self.seq.next();
        self.active = Some(handle);
        handle
    }

    pub fn cancel(&mut self) -> bool {
        self.active.take().is_some()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn frame(&self) -> Option<TimerHandle> {
        self.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn one_shot_fires_once() {
        let t0 = Instant::now();
        let mut timer = OneShot::new();
        let h = timer.arm(t0 + Duration::from_millis(100));
        assert!(timer.take_due(t0).is_none());
        assert!(timer.take_due(t0 + Duration::from_millis(99)).is_none());
        assert_eq!(timer.take_due(t0 + Duration::from_millis(100)), Some(h));
        assert!(timer.take_due(t0 + Duration::from_secs(10)).is_none());
        assert!(!timer.is_armed());
    }

    #[test]
    fn rearm_replaces_and_invalidates() {
        let t0 = Instant::now();
        let mut timer = OneShot::new();
        let first = timer.arm(t0 + Duration::from_millis(10));
        let second = timer.arm(t0 + Duration::from_millis(50));
        assert_ne!(first, second);
        assert!(timer.take_due(t0 + Duration::from_millis(20)).is_none());
        assert_eq!(timer.take_due(t0 + Duration::from_millis(50)), Some(second));
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut timer = OneShot::new();
        assert!(!timer.cancel());
        timer.arm(Instant::now());
        assert!(timer.cancel());
        assert!(!timer.cancel());
        assert!(timer.take_due(Instant::now()).is_none());
    }

    #[test]
    fn frame_loop_handles_are_fresh() {
        let mut frames = FrameLoop::new();
        assert!(frames.frame().is_none());
        let a = frames.start();
        assert_eq!(frames.frame(), Some(a));
        assert!(frames.cancel());
        assert!(frames.frame().is_none());
        assert!(!frames.cancel());
        let b = frames.start();
        assert_ne!(a, b);
    }
}
