//! # pcdice-types
//!
//! Shared type definitions for pcdice.
//! Plain data only: the pattern matrix, timing settings, MIDI wire types,
//! engine lifecycle enums and the action vocabulary. No I/O lives here.

pub mod action;
pub mod engine;
pub mod midi;
pub mod pattern;
pub mod timing;

pub use action::*;
pub use engine::{DispatchOutcome, EngineState};
pub use midi::{ConnectionState, MidiChannel, OutputPort, ProgramChange};
pub use pattern::{
    BankIndex, Candidate, PatternMatrix, SlotIndex, NUM_BANKS, NUM_SLOTS, SLOTS_PER_BANK,
};
pub use timing::{dispatch_interval, StepCount, Tempo, DEFAULT_BPM, MAX_BPM, MIN_BPM};
