use std::time::Duration;

use pcdice_core::engine::Engine;
use pcdice_core::midi::MidiOutputs;
use pcdice_core::surface::SurfaceState;
use pcdice_types::{EngineState, MidiChannel, OutputPort, PatternMatrix, StepCount, Tempo};

/// Read-only snapshot of the engine taken once per frame. Panes and the
/// frame render from this, never from the engine directly.
#[derive(Debug, Clone)]
pub struct SessionView {
    pub state: EngineState,
    pub tempo: Tempo,
    pub steps: StepCount,
    pub channel: MidiChannel,
    pub interval: Duration,
    pub patterns: PatternMatrix,
    pub outputs: Vec<OutputPort>,
    pub selected_output: Option<usize>,
    pub surface: SurfaceState,
    pub skipped_ticks: u64,
}

impl SessionView {
    pub fn capture<O: MidiOutputs>(engine: &Engine<O, SurfaceState>) -> Self {
        Self {
            state: engine.state(),
            tempo: engine.tempo(),
            steps: engine.steps(),
            channel: engine.channel(),
            interval: engine.interval(),
            patterns: engine.patterns().clone(),
            outputs: engine.devices().outputs().to_vec(),
            selected_output: engine.devices().selected_index(),
            surface: engine.surface().clone(),
            skipped_ticks: engine.skipped_ticks(),
        }
    }

    pub fn selected_output_name(&self) -> Option<&str> {
        self.selected_output
            .and_then(|i| self.outputs.get(i))
            .map(|p| p.name.as_str())
    }
}

impl Default for SessionView {
    fn default() -> Self {
        Self {
            state: EngineState::Idle,
            tempo: Tempo::default(),
            steps: StepCount::default(),
            channel: MidiChannel::default(),
            interval: pcdice_types::dispatch_interval(Tempo::default(), StepCount::default()),
            patterns: PatternMatrix::default(),
            outputs: Vec::new(),
            selected_output: None,
            surface: SurfaceState::default(),
            skipped_ticks: 0,
        }
    }
}
