//! Display capability used by the engine.

use pcdice_types::{Candidate, EngineState};

/// What the engine tells the operator. Implementations only record or draw;
/// they never call back into the engine.
pub trait Surface {
    fn show_state(&mut self, state: EngineState);
    fn show_tap_hint(&mut self, visible: bool);
    fn show_selection(&mut self, candidate: Candidate);
    fn clear_selection(&mut self);
    /// Fraction of the current interval elapsed, 0.0..=1.0.
    fn show_progress(&mut self, fraction: f32);
    fn show_error(&mut self, message: &str);
    fn clear_error(&mut self);
}

/// Plain snapshot of everything shown. The terminal UI renders from this.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurfaceState {
    pub state: EngineState,
    pub tap_hint: bool,
    pub selection: Option<Candidate>,
    pub progress: f32,
    pub error: Option<String>,
    /// Successful dispatches shown since startup.
    pub dispatch_count: u64,
}

impl Surface for SurfaceState {
    fn show_state(&mut self, state: EngineState) {
        self.state = state;
    }

    fn show_tap_hint(&mut self, visible: bool) {
        self.tap_hint = visible;
    }

    fn show_selection(&mut self, candidate: Candidate) {
        self.selection = Some(candidate);
        self.dispatch_count += 1;
    }

    fn clear_selection(&mut self) {
        self.selection = None;
    }

    fn show_progress(&mut self, fraction: f32) {
        self.progress = fraction.clamp(0.0, 1.0);
    }

    fn show_error(&mut self, message: &str) {
        self.error = Some(message.to_string());
    }

    fn clear_error(&mut self) {
        self.error = None;
    }
}
