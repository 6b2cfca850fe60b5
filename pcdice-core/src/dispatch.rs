use std::time::Instant;

use pcdice_types::{
    Action, DispatchResult, NoticeLevel, OutputAction, PatternAction, TimingAction,
    TransportAction, Tempo,
};

use crate::engine::{Engine, StartRefused};
use crate::midi::MidiOutputs;
use crate::surface::Surface;

/// Apply one operator intent to the engine. Returns what the UI layer has to
/// do next: quit, or show a notice.
pub fn dispatch_action<O: MidiOutputs, S: Surface>(
    action: &Action,
    engine: &mut Engine<O, S>,
    now: Instant,
) -> DispatchResult {
    match action {
        Action::None => DispatchResult::none(),
        Action::Quit => {
            engine.stop();
            engine.cancel();
            DispatchResult::with_quit()
        }
        Action::Transport(a) => dispatch_transport(*a, engine, now),
        Action::Pattern(a) => {
            match *a {
                PatternAction::Toggle { bank, slot } => engine.toggle_slot(bank, slot),
                PatternAction::FillAll(bank) => engine.fill_all(bank),
                PatternAction::FillNone(bank) => engine.fill_none(bank),
            }
            DispatchResult::none()
        }
        Action::Timing(a) => {
            match *a {
                TimingAction::SetBpm(bpm) => engine.set_tempo(Tempo::new(bpm), now),
                TimingAction::AdjustBpm(delta) => engine.adjust_tempo(delta, now),
                TimingAction::ToggleSteps => engine.toggle_steps(now),
            }
            DispatchResult::none()
        }
        Action::Output(a) => dispatch_output(a, engine),
    }
}

fn dispatch_transport<O: MidiOutputs, S: Surface>(
    action: TransportAction,
    engine: &mut Engine<O, S>,
    now: Instant,
) -> DispatchResult {
    // Send errors are on the surface already. Disconnected and NoPattern end
    // the run without any message.
    match action {
        TransportAction::Start => {
            if let Err(e) = engine.start() {
                return refused(e);
            }
        }
        TransportAction::Toggle => {
            if let Err(e) = engine.toggle_run(now) {
                return refused(e);
            }
        }
        TransportAction::Tap => {
            engine.tap(now);
        }
        TransportAction::Resync => {
            engine.resync(now);
        }
        TransportAction::Cancel => {
            engine.cancel();
        }
        TransportAction::Stop => {
            engine.stop();
        }
    }
    DispatchResult::none()
}

fn refused(e: StartRefused) -> DispatchResult {
    DispatchResult::with_notice(NoticeLevel::Warning, format!("Cannot start: {}", e))
}

fn dispatch_output<O: MidiOutputs, S: Surface>(
    action: &OutputAction,
    engine: &mut Engine<O, S>,
) -> DispatchResult {
    let was_active = !engine.state().is_idle();
    let bound = match action {
        OutputAction::Select(id) => engine.select_device(id),
        OutputAction::SelectNext => engine.select_next_device(),
        OutputAction::SelectPrev => engine.select_prev_device(),
        OutputAction::AdjustChannel(delta) => {
            engine.adjust_channel(*delta);
            return DispatchResult::none();
        }
    };

    let mut result = DispatchResult::none();
    if was_active && engine.state().is_idle() {
        result.push_notice(NoticeLevel::Info, "Stopped: output changed");
    }
    match (bound, engine.devices().handle()) {
        (true, Some(h)) => result.push_notice(NoticeLevel::Info, format!("Output: {}", h.name)),
        _ => result.push_notice(NoticeLevel::Warning, "No output selected"),
    }
    result
}
