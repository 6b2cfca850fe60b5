//! The dispatch engine: run lifecycle, per-tick dispatch, forced stops.
//!
//! All session state lives here. The control loop feeds the engine intents
//! and the current time; the engine never reads the clock itself.

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use pcdice_types::{
    dispatch_interval, BankIndex, Candidate, DispatchOutcome, EngineState, MidiChannel,
    OutputPort, PatternMatrix, ProgramChange, SlotIndex, StepCount, Tempo,
};

use crate::device::{DeviceEvent, DeviceTracker};
use crate::midi::MidiOutputs;
use crate::scheduler::DriftScheduler;
use crate::surface::Surface;
use crate::timer::{FrameLoop, OneShot};

pub const DEFAULT_ERROR_DISPLAY: Duration = Duration::from_secs(5);

/// Initial values for a session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    pub tempo: Tempo,
    pub steps: StepCount,
    pub channel: MidiChannel,
    /// How long a send error stays on screen.
    pub error_display: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            tempo: Tempo::default(),
            steps: StepCount::default(),
            channel: MidiChannel::default(),
            error_display: DEFAULT_ERROR_DISPLAY,
        }
    }
}

/// Why a start intent left the engine Idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StartRefused {
    #[error("no output device selected")]
    NoDevice,
    #[error("no pattern slots enabled")]
    NoPattern,
    #[error("already started")]
    AlreadyActive,
}

pub struct Engine<O, S> {
    state: EngineState,
    patterns: PatternMatrix,
    devices: DeviceTracker,
    scheduler: DriftScheduler,
    progress: FrameLoop,
    error_dismiss: OneShot,
    tempo: Tempo,
    steps: StepCount,
    channel: MidiChannel,
    error_display: Duration,
    last_dispatch: Option<Instant>,
    last_candidate: Option<Candidate>,
    outputs: O,
    surface: S,
    rng: StdRng,
}

impl<O: MidiOutputs, S: Surface> Engine<O, S> {
    pub fn new(outputs: O, surface: S, settings: EngineSettings) -> Self {
        Self::with_rng(outputs, surface, settings, StdRng::from_os_rng())
    }

    /// Construct with a caller-supplied random source (seeded in tests).
    pub fn with_rng(outputs: O, mut surface: S, settings: EngineSettings, rng: StdRng) -> Self {
        surface.show_state(EngineState::Idle);
        surface.show_tap_hint(false);
        surface.show_progress(0.0);
        Self {
            state: EngineState::Idle,
            patterns: PatternMatrix::default(),
            devices: DeviceTracker::new(),
            scheduler: DriftScheduler::new(),
            progress: FrameLoop::new(),
            error_dismiss: OneShot::new(),
            tempo: settings.tempo,
            steps: settings.steps,
            channel: settings.channel,
            error_display: settings.error_display,
            last_dispatch: None,
            last_candidate: None,
            outputs,
            surface,
            rng,
        }
    }

    // --- accessors ---

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn patterns(&self) -> &PatternMatrix {
        &self.patterns
    }

    pub fn devices(&self) -> &DeviceTracker {
        &self.devices
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn outputs(&self) -> &O {
        &self.outputs
    }

    pub fn outputs_mut(&mut self) -> &mut O {
        &mut self.outputs
    }

    pub fn tempo(&self) -> Tempo {
        self.tempo
    }

    pub fn steps(&self) -> StepCount {
        self.steps
    }

    pub fn channel(&self) -> MidiChannel {
        self.channel
    }

    pub fn interval(&self) -> Duration {
        dispatch_interval(self.tempo, self.steps)
    }

    pub fn last_candidate(&self) -> Option<Candidate> {
        self.last_candidate
    }

    pub fn next_tick_at(&self) -> Option<Instant> {
        self.scheduler.next_fire_at()
    }

    pub fn skipped_ticks(&self) -> u64 {
        self.scheduler.skipped_ticks()
    }

    /// Earliest instant at which `poll` has timed work to do. Progress frames
    /// are not included; the loop paces those itself.
    pub fn next_wake(&self) -> Option<Instant> {
        match (self.scheduler.next_fire_at(), self.error_dismiss.fire_at()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn is_animating(&self) -> bool {
        self.progress.is_active()
    }

    // --- lifecycle ---

    /// Idle -> Waiting. Refused without a device or with every slot off.
    pub fn start(&mut self) -> Result<(), StartRefused> {
        if !self.state.is_idle() {
            return Err(StartRefused::AlreadyActive);
        }
        if !self.devices.has_target() {
            log::info!(target: "engine", "start refused: no device");
            return Err(StartRefused::NoDevice);
        }
        if !self.patterns.has_active() {
            log::info!(target: "engine", "start refused: no active slots");
            return Err(StartRefused::NoPattern);
        }
        self.set_state(EngineState::Waiting);
        self.surface.show_tap_hint(true);
        Ok(())
    }

    /// Waiting -> Running on a successful first dispatch. Returns `None` when
    /// not Waiting.
    pub fn tap(&mut self, now: Instant) -> Option<DispatchOutcome> {
        if self.state != EngineState::Waiting {
            return None;
        }
        let outcome = self.dispatch();
        match &outcome {
            DispatchOutcome::Ok(_) => {
                self.set_state(EngineState::Running);
                self.surface.show_tap_hint(false);
                self.scheduler.start(self.interval(), now);
                self.last_dispatch = Some(now);
                self.progress.start();
                self.surface.show_progress(0.0);
            }
            DispatchOutcome::SendError(msg) => {
                self.go_idle();
                self.surface_error(msg, now);
            }
            DispatchOutcome::Disconnected | DispatchOutcome::NoPattern => self.go_idle(),
        }
        Some(outcome)
    }

    /// Waiting -> Idle.
    pub fn cancel(&mut self) -> bool {
        if self.state != EngineState::Waiting {
            return false;
        }
        self.go_idle();
        true
    }

    /// Running -> Idle.
    pub fn stop(&mut self) -> bool {
        if self.state != EngineState::Running {
            return false;
        }
        self.go_idle();
        true
    }

    /// Dispatch immediately and re-anchor the period at `now`. A send error
    /// keeps the run going on its old deadline.
    pub fn resync(&mut self, now: Instant) -> Option<DispatchOutcome> {
        if self.state != EngineState::Running {
            return None;
        }
        let outcome = self.dispatch();
        match &outcome {
            DispatchOutcome::Ok(_) => {
                log::debug!(target: "engine", "resync");
                self.scheduler.restart(self.interval(), now);
                self.last_dispatch = Some(now);
            }
            DispatchOutcome::SendError(msg) => self.surface_error(msg, now),
            DispatchOutcome::Disconnected | DispatchOutcome::NoPattern => self.go_idle(),
        }
        Some(outcome)
    }

    /// Single start/stop control: start when Idle, tap when Waiting, stop
    /// when Running.
    pub fn toggle_run(&mut self, now: Instant) -> Result<Option<DispatchOutcome>, StartRefused> {
        match self.state {
            EngineState::Idle => self.start().map(|()| None),
            EngineState::Waiting => Ok(self.tap(now)),
            EngineState::Running => {
                self.stop();
                Ok(None)
            }
        }
    }

    /// Run whatever timed work is due at `now`: a scheduler tick, the error
    /// dismissal, and one progress frame.
    pub fn poll(&mut self, now: Instant) {
        if let Some(handle) = self.scheduler.take_due(now) {
            self.on_tick(now);
            // Stale if the tick ended the run.
            self.scheduler.complete(handle, now);
        }

        if self.error_dismiss.take_due(now).is_some() {
            self.surface.clear_error();
        }

        if self.progress.frame().is_some() {
            let fraction = match self.last_dispatch {
                Some(at) => {
                    let elapsed = now.saturating_duration_since(at).as_secs_f64();
                    (elapsed / self.interval().as_secs_f64()).min(1.0) as f32
                }
                None => 0.0,
            };
            self.surface.show_progress(fraction);
        }
    }

    fn on_tick(&mut self, now: Instant) {
        match self.dispatch() {
            DispatchOutcome::Ok(_) => self.last_dispatch = Some(now),
            DispatchOutcome::SendError(msg) => {
                self.go_idle();
                self.surface_error(&msg, now);
            }
            DispatchOutcome::Disconnected | DispatchOutcome::NoPattern => self.go_idle(),
        }
    }

    /// Pick one active slot at random and send it. Never changes state.
    pub fn dispatch(&mut self) -> DispatchOutcome {
        let Some(handle) = self.devices.handle() else {
            log::debug!(target: "engine", "dispatch skipped: no output bound");
            return DispatchOutcome::Disconnected;
        };
        let port_id = handle.id.clone();

        let candidates = self.patterns.active_candidates();
        if candidates.is_empty() {
            log::debug!(target: "engine", "dispatch skipped: no active slots");
            return DispatchOutcome::NoPattern;
        }
        let chosen = candidates[self.rng.random_range(0..candidates.len())];

        let msg = ProgramChange::new(self.channel, chosen.code);
        if let Err(e) = self.outputs.send(&port_id, &msg) {
            log::warn!(target: "engine", "dispatch to '{}' failed: {}", port_id, e);
            return DispatchOutcome::SendError(e.to_string());
        }
        log::debug!(
            target: "engine",
            "{} -> program {} ch {}",
            chosen,
            chosen.code,
            self.channel.display()
        );

        self.last_candidate = Some(chosen);
        self.surface.show_selection(chosen);
        self.error_dismiss.cancel();
        self.surface.clear_error();
        DispatchOutcome::Ok(chosen)
    }

    // --- patterns ---

    pub fn toggle_slot(&mut self, bank: BankIndex, slot: SlotIndex) {
        self.patterns.toggle(bank, slot);
        self.check_patterns();
    }

    pub fn fill_all(&mut self, bank: BankIndex) {
        self.patterns.fill_all(bank);
    }

    pub fn fill_none(&mut self, bank: BankIndex) {
        self.patterns.fill_none(bank);
        self.check_patterns();
    }

    fn check_patterns(&mut self) {
        if !self.patterns.has_active() && !self.state.is_idle() {
            log::info!(target: "engine", "every slot disabled, stopping");
            self.go_idle();
        }
    }

    // --- timing ---

    pub fn set_tempo(&mut self, tempo: Tempo, now: Instant) {
        if tempo != self.tempo {
            self.tempo = tempo;
            self.timing_changed(now);
        }
    }

    pub fn adjust_tempo(&mut self, delta: i32, now: Instant) {
        self.set_tempo(self.tempo.offset(delta), now);
    }

    pub fn set_steps(&mut self, steps: StepCount, now: Instant) {
        if steps != self.steps {
            self.steps = steps;
            self.timing_changed(now);
        }
    }

    pub fn toggle_steps(&mut self, now: Instant) {
        self.set_steps(self.steps.toggled(), now);
    }

    fn timing_changed(&mut self, now: Instant) {
        log::debug!(
            target: "engine",
            "{} bpm, {} steps, interval {:?}",
            self.tempo.bpm(),
            self.steps.steps(),
            self.interval()
        );
        if self.state == EngineState::Running {
            self.scheduler.restart(self.interval(), now);
            self.last_dispatch = Some(now);
        }
    }

    pub fn set_channel(&mut self, channel: MidiChannel) {
        log::debug!(target: "engine", "channel {}", channel.display());
        self.channel = channel;
    }

    pub fn adjust_channel(&mut self, delta: i32) {
        self.set_channel(self.channel.offset(delta));
    }

    // --- devices ---

    /// Bind the output with `id`. Returns whether a target is bound.
    pub fn select_device(&mut self, id: &str) -> bool {
        self.rebind(|devices| {
            devices.select(id);
        })
    }

    pub fn select_next_device(&mut self) -> bool {
        self.rebind(|devices| {
            devices.select_next();
        })
    }

    pub fn select_prev_device(&mut self) -> bool {
        self.rebind(|devices| {
            devices.select_prev();
        })
    }

    fn rebind(&mut self, change: impl FnOnce(&mut DeviceTracker)) -> bool {
        let before = self.devices.handle().cloned();
        change(&mut self.devices);
        if self.devices.handle() != before.as_ref() {
            if !self.state.is_idle() {
                log::info!(target: "engine", "output changed, stopping");
                self.go_idle();
            }
            if let Some(old) = before {
                self.outputs.release(&old.id);
            }
        }
        self.devices.has_target()
    }

    /// Re-enumerate outputs and apply the result.
    pub fn refresh_outputs(&mut self) -> bool {
        let ports = self.outputs.list_outputs();
        self.apply_outputs(&ports)
    }

    /// React to a new enumeration. A vanished target forces Idle before the
    /// selectable list is rebuilt. Returns true when the list changed.
    pub fn apply_outputs(&mut self, ports: &[OutputPort]) -> bool {
        if let Some(DeviceEvent::SelectedDisconnected(handle)) = self.devices.observe(ports) {
            log::info!(target: "device", "'{}' disconnected", handle.name);
            if !self.state.is_idle() {
                self.go_idle();
            }
            self.devices.clear();
            self.outputs.release(&handle.id);
        }
        self.devices.refresh(ports)
    }

    // --- internals ---

    fn set_state(&mut self, state: EngineState) {
        if state != self.state {
            log::info!(target: "engine", "{} -> {}", self.state.label(), state.label());
            self.state = state;
            self.surface.show_state(state);
        }
    }

    /// Leave Waiting/Running. The error banner is left alone so a failure
    /// that ended the run stays visible.
    fn go_idle(&mut self) {
        self.scheduler.cancel();
        self.progress.cancel();
        self.last_dispatch = None;
        self.last_candidate = None;
        self.set_state(EngineState::Idle);
        self.surface.show_tap_hint(false);
        self.surface.show_progress(0.0);
        self.surface.clear_selection();
    }

    fn surface_error(&mut self, message: &str, now: Instant) {
        self.surface.show_error(message);
        self.error_dismiss.arm(now + self.error_display);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::MidiError;
    use crate::surface::SurfaceState;

    #[derive(Default)]
    struct Outputs {
        ports: Vec<OutputPort>,
        sent: Vec<(String, [u8; 2])>,
        fail: bool,
    }

    impl MidiOutputs for Outputs {
        fn list_outputs(&mut self) -> Vec<OutputPort> {
            self.ports.clone()
        }

        fn send(&mut self, port_id: &str, msg: &ProgramChange) -> Result<(), MidiError> {
            if self.fail {
                return Err(MidiError::UnknownPort(port_id.to_string()));
            }
            self.sent.push((port_id.to_string(), msg.to_bytes()));
            Ok(())
        }
    }

    fn engine() -> Engine<Outputs, SurfaceState> {
        let outputs = Outputs {
            ports: vec![OutputPort::connected("t8", "TR-8S")],
            ..Outputs::default()
        };
        let mut e = Engine::with_rng(
            outputs,
            SurfaceState::default(),
            EngineSettings::default(),
            StdRng::seed_from_u64(7),
        );
        e.refresh_outputs();
        e.select_device("t8");
        e
    }

    fn bank(b: u8) -> BankIndex {
        BankIndex::new(b).unwrap()
    }

    fn slot(s: u8) -> SlotIndex {
        SlotIndex::new(s).unwrap()
    }

    #[test]
    fn start_requires_device() {
        let mut e = Engine::with_rng(
            Outputs::default(),
            SurfaceState::default(),
            EngineSettings::default(),
            StdRng::seed_from_u64(1),
        );
        assert_eq!(e.start(), Err(StartRefused::NoDevice));
        assert_eq!(e.state(), EngineState::Idle);
    }

    #[test]
    fn start_requires_active_slot() {
        let mut e = engine();
        for b in BankIndex::all() {
            e.fill_none(b);
        }
        assert_eq!(e.start(), Err(StartRefused::NoPattern));
        assert_eq!(e.state(), EngineState::Idle);
    }

    #[test]
    fn start_then_tap_runs() {
        let t0 = Instant::now();
        let mut e = engine();
        e.start().unwrap();
        assert_eq!(e.state(), EngineState::Waiting);
        assert!(e.surface().tap_hint);
        assert_eq!(e.start(), Err(StartRefused::AlreadyActive));

        let outcome = e.tap(t0).unwrap();
        assert!(outcome.is_ok());
        assert_eq!(e.state(), EngineState::Running);
        assert!(!e.surface().tap_hint);
        assert_eq!(e.next_tick_at(), Some(t0 + Duration::from_secs(2)));
        assert_eq!(e.outputs().sent.len(), 1);
    }

    #[test]
    fn tap_outside_waiting_is_ignored() {
        let mut e = engine();
        assert!(e.tap(Instant::now()).is_none());
        assert!(e.outputs().sent.is_empty());
    }

    #[test]
    fn only_enabled_slot_is_sent() {
        let t0 = Instant::now();
        let mut e = engine();
        for b in BankIndex::all() {
            e.fill_none(b);
        }
        e.toggle_slot(bank(3), slot(5));
        e.set_channel(MidiChannel::from_display(10));
        e.start().unwrap();
        let outcome = e.tap(t0).unwrap();
        let expected = Candidate::new(bank(3), slot(5));
        assert_eq!(outcome, DispatchOutcome::Ok(expected));
        assert_eq!(e.outputs().sent[0], ("t8".to_string(), [0xC9, 36]));
        assert_eq!(e.surface().selection, Some(expected));
    }

    #[test]
    fn tick_dispatches_and_keeps_running() {
        let t0 = Instant::now();
        let mut e = engine();
        e.start().unwrap();
        e.tap(t0);
        e.poll(t0 + Duration::from_millis(1999));
        assert_eq!(e.outputs().sent.len(), 1);
        e.poll(t0 + Duration::from_secs(2));
        assert_eq!(e.outputs().sent.len(), 2);
        assert_eq!(e.state(), EngineState::Running);
        assert_eq!(e.next_tick_at(), Some(t0 + Duration::from_secs(4)));
    }

    #[test]
    fn progress_tracks_elapsed_fraction() {
        let t0 = Instant::now();
        let mut e = engine();
        e.start().unwrap();
        e.tap(t0);
        e.poll(t0 + Duration::from_millis(500));
        assert!((e.surface().progress - 0.25).abs() < 1e-6);
        e.stop();
        assert_eq!(e.surface().progress, 0.0);
        assert!(!e.is_animating());
    }

    #[test]
    fn stop_clears_everything() {
        let t0 = Instant::now();
        let mut e = engine();
        e.start().unwrap();
        e.tap(t0);
        assert!(e.stop());
        assert_eq!(e.state(), EngineState::Idle);
        assert!(e.next_tick_at().is_none());
        assert!(e.surface().selection.is_none());
        assert!(e.last_candidate().is_none());
        assert!(!e.stop());
        e.poll(t0 + Duration::from_secs(10));
        assert_eq!(e.outputs().sent.len(), 1);
    }

    #[test]
    fn cancel_from_waiting() {
        let mut e = engine();
        e.start().unwrap();
        assert!(e.cancel());
        assert_eq!(e.state(), EngineState::Idle);
        assert!(!e.surface().tap_hint);
        assert!(!e.cancel());
    }

    #[test]
    fn toggle_run_cycles() {
        let t0 = Instant::now();
        let mut e = engine();
        assert_eq!(e.toggle_run(t0), Ok(None));
        assert_eq!(e.state(), EngineState::Waiting);
        assert!(matches!(e.toggle_run(t0), Ok(Some(DispatchOutcome::Ok(_)))));
        assert_eq!(e.state(), EngineState::Running);
        assert_eq!(e.toggle_run(t0), Ok(None));
        assert_eq!(e.state(), EngineState::Idle);
    }

    #[test]
    fn tempo_change_while_running_restarts() {
        let t0 = Instant::now();
        let mut e = engine();
        e.start().unwrap();
        e.tap(t0);
        let t1 = t0 + Duration::from_millis(700);
        e.set_tempo(Tempo::new(60), t1);
        assert_eq!(e.next_tick_at(), Some(t1 + Duration::from_secs(4)));
        e.poll(t1);
        assert_eq!(e.surface().progress, 0.0);

        let t2 = t1 + Duration::from_secs(1);
        e.toggle_steps(t2);
        assert_eq!(e.steps(), StepCount::ThirtyTwo);
        assert_eq!(e.next_tick_at(), Some(t2 + Duration::from_secs(8)));
        assert_eq!(e.state(), EngineState::Running);
    }

    #[test]
    fn tempo_change_while_idle_only_updates_interval() {
        let t0 = Instant::now();
        let mut e = engine();
        e.adjust_tempo(-1000, t0);
        assert_eq!(e.tempo().bpm(), 30);
        assert_eq!(e.interval(), Duration::from_secs(8));
        assert!(e.next_tick_at().is_none());
    }

    #[test]
    fn emptying_patterns_forces_idle() {
        let t0 = Instant::now();
        let mut e = engine();
        e.start().unwrap();
        e.tap(t0);
        for b in BankIndex::all() {
            e.fill_none(b);
        }
        assert_eq!(e.state(), EngineState::Idle);
        assert!(e.next_tick_at().is_none());
    }

    #[test]
    fn changing_device_forces_idle() {
        let t0 = Instant::now();
        let mut e = engine();
        let mut ports = e.outputs().ports.clone();
        ports.push(OutputPort::connected("iac", "IAC Bus"));
        e.apply_outputs(&ports);
        e.start().unwrap();
        e.tap(t0);
        assert!(e.select_device("iac"));
        assert_eq!(e.state(), EngineState::Idle);
    }

    #[test]
    fn reselecting_same_device_keeps_running() {
        let t0 = Instant::now();
        let mut e = engine();
        e.start().unwrap();
        e.tap(t0);
        e.select_device("t8");
        assert_eq!(e.state(), EngineState::Running);
    }

    #[test]
    fn dispatch_does_not_change_state() {
        let mut e = engine();
        assert!(e.dispatch().is_ok());
        assert_eq!(e.state(), EngineState::Idle);
        e.outputs.fail = true;
        assert!(matches!(e.dispatch(), DispatchOutcome::SendError(_)));
        assert_eq!(e.state(), EngineState::Idle);
    }

    #[test]
    fn next_wake_prefers_earliest_timer() {
        let t0 = Instant::now();
        let mut e = engine();
        assert!(e.next_wake().is_none());
        e.start().unwrap();
        e.tap(t0);
        assert_eq!(e.next_wake(), Some(t0 + Duration::from_secs(2)));
        e.outputs.fail = true;
        e.resync(t0 + Duration::from_millis(100));
        // The error dismisses at +5.1s, after the next tick.
        assert_eq!(e.next_wake(), Some(t0 + Duration::from_secs(2)));
    }
}
