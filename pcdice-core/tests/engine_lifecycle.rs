use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;

use pcdice_core::dispatch::dispatch_action;
use pcdice_core::engine::{Engine, EngineSettings};
use pcdice_core::midi::{MidiError, MidiOutputs};
use pcdice_core::surface::SurfaceState;
use pcdice_types::{
    Action, BankIndex, ConnectionState, DispatchOutcome, EngineState, OutputAction, OutputPort,
    PatternAction, ProgramChange, SlotIndex, TimingAction, TransportAction,
};

/// Output host double: a fixed port list, a send log, and a failure switch.
#[derive(Default)]
struct FakeOutputs {
    ports: Vec<OutputPort>,
    sent: Vec<[u8; 2]>,
    fail_sends: bool,
    released: Vec<String>,
}

impl MidiOutputs for FakeOutputs {
    fn list_outputs(&mut self) -> Vec<OutputPort> {
        self.ports.clone()
    }

    fn send(&mut self, port_id: &str, msg: &ProgramChange) -> Result<(), MidiError> {
        if self.fail_sends || !self.ports.iter().any(|p| p.id == port_id) {
            return Err(MidiError::Connect {
                port: port_id.to_string(),
                reason: "device busy".to_string(),
            });
        }
        self.sent.push(msg.to_bytes());
        Ok(())
    }

    fn release(&mut self, port_id: &str) {
        self.released.push(port_id.to_string());
    }
}

type TestEngine = Engine<FakeOutputs, SurfaceState>;

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn t8() -> OutputPort {
    OutputPort::connected("TR-8S", "TR-8S")
}

/// Engine with one connected output, bound.
fn bound_engine(seed: u64) -> TestEngine {
    let outputs = FakeOutputs {
        ports: vec![t8()],
        ..FakeOutputs::default()
    };
    let mut engine = Engine::with_rng(
        outputs,
        SurfaceState::default(),
        EngineSettings::default(),
        StdRng::seed_from_u64(seed),
    );
    engine.refresh_outputs();
    assert!(engine.select_device("TR-8S"));
    engine
}

fn set_fail(engine: &mut TestEngine, fail: bool) {
    engine.outputs_mut().fail_sends = fail;
}

fn act(engine: &mut TestEngine, action: Action, now: Instant) {
    dispatch_action(&action, engine, now);
}

fn transport(a: TransportAction) -> Action {
    Action::Transport(a)
}

/// Start and tap at `t0`; returns the engine in Running.
fn running_engine(t0: Instant) -> TestEngine {
    let mut engine = bound_engine(11);
    act(&mut engine, transport(TransportAction::Start), t0);
    act(&mut engine, transport(TransportAction::Tap), t0);
    assert_eq!(engine.state(), EngineState::Running);
    engine
}

fn clear_all(engine: &mut TestEngine, now: Instant) {
    for bank in BankIndex::all() {
        act(engine, Action::Pattern(PatternAction::FillNone(bank)), now);
    }
}

fn assert_fully_idle(engine: &TestEngine) {
    assert_eq!(engine.state(), EngineState::Idle);
    assert_eq!(engine.surface().state, EngineState::Idle);
    assert!(engine.next_tick_at().is_none());
    assert!(!engine.is_animating());
    assert!(!engine.surface().tap_hint);
    assert_eq!(engine.surface().progress, 0.0);
    assert!(engine.surface().selection.is_none());
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[test]
fn idle_is_reachable_from_every_state() {
    let t0 = Instant::now();

    let mut waiting = bound_engine(1);
    act(&mut waiting, transport(TransportAction::Start), t0);
    assert_eq!(waiting.state(), EngineState::Waiting);
    act(&mut waiting, transport(TransportAction::Cancel), t0);
    assert_fully_idle(&waiting);

    let mut running = running_engine(t0);
    act(&mut running, transport(TransportAction::Stop), t0 + ms(300));
    assert_fully_idle(&running);

    let mut idle = bound_engine(2);
    act(&mut idle, transport(TransportAction::Stop), t0);
    act(&mut idle, transport(TransportAction::Cancel), t0);
    assert_fully_idle(&idle);
}

#[test]
fn tap_send_error_returns_to_idle_with_error() {
    let t0 = Instant::now();
    let mut engine = bound_engine(3);
    act(&mut engine, transport(TransportAction::Start), t0);
    set_fail(&mut engine, true);
    let outcome = engine.tap(t0);
    assert!(matches!(outcome, Some(DispatchOutcome::SendError(_))));
    assert_fully_idle(&engine);
    assert_eq!(
        engine.surface().error.as_deref(),
        Some("could not open 'TR-8S': device busy")
    );
}

#[test]
fn all_slots_off_gives_no_pattern_without_error() {
    let t0 = Instant::now();
    let mut engine = bound_engine(4);
    act(&mut engine, transport(TransportAction::Start), t0);
    assert_eq!(engine.state(), EngineState::Waiting);

    // Clearing the store while Waiting forces Idle on its own.
    clear_all(&mut engine, t0);
    assert_fully_idle(&engine);
    assert_eq!(engine.dispatch(), DispatchOutcome::NoPattern);
    assert!(engine.surface().error.is_none());
    assert!(engine.outputs().sent.is_empty());
}

#[test]
fn emptied_store_stops_a_run() {
    let t0 = Instant::now();
    let mut engine = running_engine(t0);
    clear_all(&mut engine, t0 + ms(100));
    assert_fully_idle(&engine);
    engine.poll(t0 + ms(5000));
    assert_eq!(engine.outputs().sent.len(), 1);
    assert!(engine.surface().error.is_none());
}

#[test]
fn tick_send_error_terminates_run() {
    let t0 = Instant::now();
    let mut engine = running_engine(t0);
    set_fail(&mut engine, true);
    engine.poll(t0 + ms(2000));
    assert_fully_idle(&engine);
    assert!(engine.surface().error.is_some());
    // The failed tick cannot re-arm the loop.
    engine.poll(t0 + ms(4000));
    assert!(engine.next_tick_at().is_none());
}

// ---------------------------------------------------------------------------
// Resync
// ---------------------------------------------------------------------------

#[test]
fn resync_send_error_keeps_running_on_old_deadline() {
    let t0 = Instant::now();
    let mut engine = running_engine(t0);
    let deadline = engine.next_tick_at();
    assert_eq!(deadline, Some(t0 + ms(2000)));

    set_fail(&mut engine, true);
    let outcome = engine.resync(t0 + ms(700));
    assert!(matches!(outcome, Some(DispatchOutcome::SendError(_))));
    assert_eq!(engine.state(), EngineState::Running);
    assert_eq!(engine.next_tick_at(), deadline);
    assert!(engine.surface().error.is_some());
}

#[test]
fn resync_ok_reanchors() {
    let t0 = Instant::now();
    let mut engine = running_engine(t0);
    act(&mut engine, transport(TransportAction::Resync), t0 + ms(700));
    assert_eq!(engine.state(), EngineState::Running);
    assert_eq!(engine.next_tick_at(), Some(t0 + ms(2700)));
    assert_eq!(engine.outputs().sent.len(), 2);
}

#[test]
fn resync_outside_running_is_ignored() {
    let t0 = Instant::now();
    let mut engine = bound_engine(9);
    assert_eq!(engine.resync(t0), None);
    act(&mut engine, transport(TransportAction::Start), t0);
    assert_eq!(engine.resync(t0), None);
    assert_eq!(engine.state(), EngineState::Waiting);
    assert!(engine.outputs().sent.is_empty());
}

// ---------------------------------------------------------------------------
// Devices
// ---------------------------------------------------------------------------

#[test]
fn unplug_forces_idle_before_list_refresh() {
    let t0 = Instant::now();
    let mut engine = running_engine(t0);

    let unplugged = OutputPort {
        state: ConnectionState::Disconnected,
        ..t8()
    };
    let changed = engine.apply_outputs(&[unplugged]);
    assert!(changed);
    assert_fully_idle(&engine);
    assert!(!engine.devices().has_target());
    assert!(engine.devices().outputs().is_empty());
    assert_eq!(engine.outputs().released, vec!["TR-8S".to_string()]);

    // Nothing fires afterwards.
    engine.poll(t0 + ms(10_000));
    assert_eq!(engine.outputs().sent.len(), 1);
}

#[test]
fn unplug_while_waiting_forces_idle() {
    let t0 = Instant::now();
    let mut engine = bound_engine(4);
    act(&mut engine, transport(TransportAction::Start), t0);
    assert_eq!(engine.state(), EngineState::Waiting);
    assert!(engine.surface().tap_hint);

    engine.apply_outputs(&[]);
    assert_fully_idle(&engine);
    assert!(!engine.devices().has_target());
    assert!(engine.outputs().sent.is_empty());

    // A late tap finds nothing to send to.
    act(&mut engine, transport(TransportAction::Tap), t0 + ms(100));
    assert_eq!(engine.state(), EngineState::Idle);
    assert!(engine.outputs().sent.is_empty());
}

#[test]
fn replug_does_not_rebind_automatically() {
    let t0 = Instant::now();
    let mut engine = running_engine(t0);
    engine.apply_outputs(&[]);
    engine.apply_outputs(&[t8()]);
    assert!(!engine.devices().has_target());
    act(&mut engine, transport(TransportAction::Start), t0);
    assert_eq!(engine.state(), EngineState::Idle);
}

#[test]
fn device_cycling_through_actions() {
    let t0 = Instant::now();
    let mut engine = bound_engine(5);
    let mut ports = engine.outputs().ports.clone();
    ports.push(OutputPort::connected("IAC", "IAC Bus 1"));
    engine.apply_outputs(&ports);

    act(&mut engine, Action::Output(OutputAction::SelectNext), t0);
    assert_eq!(engine.devices().handle().map(|h| h.id.as_str()), Some("IAC"));
    act(&mut engine, Action::Output(OutputAction::SelectNext), t0);
    assert_eq!(engine.devices().handle().map(|h| h.id.as_str()), Some("TR-8S"));
}

// ---------------------------------------------------------------------------
// Timing
// ---------------------------------------------------------------------------

#[test]
fn default_interval_is_two_seconds() {
    let engine = bound_engine(6);
    assert_eq!(engine.interval(), ms(2000));
}

#[test]
fn thirty_two_steps_doubles_interval() {
    let t0 = Instant::now();
    let mut engine = bound_engine(6);
    act(&mut engine, Action::Timing(TimingAction::ToggleSteps), t0);
    assert_eq!(engine.interval(), ms(4000));
    act(&mut engine, Action::Timing(TimingAction::SetBpm(240)), t0);
    assert_eq!(engine.interval(), ms(2000));
}

#[test]
fn run_stays_on_grid_through_a_stall() {
    let t0 = Instant::now();
    let mut engine = bound_engine(7);
    act(&mut engine, Action::Timing(TimingAction::SetBpm(240)), t0);
    act(&mut engine, transport(TransportAction::Start), t0);
    act(&mut engine, transport(TransportAction::Tap), t0);
    assert_eq!(engine.interval(), ms(1000));

    // Wake 3ms late for every tick, except one that is 2.6s late.
    let mut fired = Vec::new();
    for i in 0..50 {
        let due = engine.next_tick_at().expect("armed");
        let late = if i == 20 { ms(2600) } else { ms(3) };
        let now = due + late;
        engine.poll(now);
        fired.push(now);
    }

    assert_eq!(engine.state(), EngineState::Running);
    assert_eq!(engine.outputs().sent.len(), 51);
    assert_eq!(engine.skipped_ticks(), 2);
    for pair in fired.windows(2) {
        assert!(pair[1].duration_since(pair[0]) >= ms(10));
    }
    let next = engine.next_tick_at().expect("armed");
    assert_eq!(next.duration_since(t0).as_millis() % 1000, 0);
}

// ---------------------------------------------------------------------------
// Error banner
// ---------------------------------------------------------------------------

#[test]
fn error_banner_dismisses_after_display_time() {
    let t0 = Instant::now();
    let mut engine = running_engine(t0);
    set_fail(&mut engine, true);
    engine.resync(t0 + ms(100));
    assert!(engine.surface().error.is_some());

    // A second error replaces the timer rather than stacking.
    engine.resync(t0 + ms(1100));
    // Stopping keeps the banner up.
    act(&mut engine, transport(TransportAction::Stop), t0 + ms(1200));
    engine.poll(t0 + ms(5100));
    assert!(engine.surface().error.is_some());
    engine.poll(t0 + ms(6100));
    assert!(engine.surface().error.is_none());
}

#[test]
fn successful_dispatch_clears_banner() {
    let t0 = Instant::now();
    let mut engine = running_engine(t0);
    set_fail(&mut engine, true);
    engine.resync(t0 + ms(100));
    set_fail(&mut engine, false);
    engine.poll(t0 + ms(2000));
    assert!(engine.surface().error.is_none());
    assert_eq!(engine.state(), EngineState::Running);
    assert_eq!(engine.next_wake(), Some(t0 + ms(4000)));
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

#[test]
fn candidates_follow_toggles() {
    let t0 = Instant::now();
    let mut engine = bound_engine(8);
    clear_all(&mut engine, t0);
    let b2 = BankIndex::new(2).unwrap();
    let s16 = SlotIndex::new(16).unwrap();
    let b4 = BankIndex::new(4).unwrap();
    let s1 = SlotIndex::new(1).unwrap();
    act(&mut engine, Action::Pattern(PatternAction::Toggle { bank: b4, slot: s1 }), t0);
    act(&mut engine, Action::Pattern(PatternAction::Toggle { bank: b2, slot: s16 }), t0);

    let codes: Vec<u8> = engine
        .patterns()
        .active_candidates()
        .iter()
        .map(|c| c.code)
        .collect();
    assert_eq!(codes, vec![31, 48]);

    for _ in 0..20 {
        match engine.dispatch() {
            DispatchOutcome::Ok(c) => assert!(c.code == 31 || c.code == 48),
            other => panic!("unexpected {:?}", other),
        }
    }
    assert!(engine
        .outputs()
        .sent
        .iter()
        .all(|bytes| bytes == &[0xC0, 31] || bytes == &[0xC0, 48]));
}

#[test]
fn channel_change_applies_to_next_dispatch() {
    let t0 = Instant::now();
    let mut engine = running_engine(t0);
    act(&mut engine, Action::Output(OutputAction::AdjustChannel(2)), t0 + ms(10));
    engine.poll(t0 + ms(2000));
    assert_eq!(engine.state(), EngineState::Running);
    assert_eq!(engine.outputs().sent.last().map(|b| b[0]), Some(0xC2));
}
