//! Tempo and step-count settings, and the dispatch interval derived from them.

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const MIN_BPM: u16 = 30;
pub const MAX_BPM: u16 = 300;
pub const DEFAULT_BPM: u16 = 120;

/// Beats per minute, always within `MIN_BPM..=MAX_BPM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "u16", into = "u16")]
pub struct Tempo(u16);

impl Tempo {
    /// Clamps into the supported range.
    pub fn new(bpm: u16) -> Self {
        Self(bpm.clamp(MIN_BPM, MAX_BPM))
    }

    pub fn bpm(self) -> u16 {
        self.0
    }

    /// Shift by `delta` bpm, clamping at the range edges.
    pub fn offset(self, delta: i32) -> Self {
        let bpm = (self.0 as i32 + delta).clamp(MIN_BPM as i32, MAX_BPM as i32);
        Self(bpm as u16)
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self(DEFAULT_BPM)
    }
}

impl From<u16> for Tempo {
    fn from(bpm: u16) -> Self {
        Tempo::new(bpm)
    }
}

impl From<Tempo> for u16 {
    fn from(t: Tempo) -> Self {
        t.0
    }
}

/// Pattern length on the target device. Only 16 and 32 steps exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StepCount {
    #[default]
    Sixteen,
    ThirtyTwo,
}

impl StepCount {
    /// Accepts exactly 16 or 32.
    pub fn from_steps(steps: u8) -> Option<Self> {
        match steps {
            16 => Some(StepCount::Sixteen),
            32 => Some(StepCount::ThirtyTwo),
            _ => None,
        }
    }

    pub fn steps(self) -> u8 {
        match self {
            StepCount::Sixteen => 16,
            StepCount::ThirtyTwo => 32,
        }
    }

    /// Bars of 4/4 covered by one pass of the pattern.
    pub fn bars(self) -> u32 {
        match self {
            StepCount::Sixteen => 1,
            StepCount::ThirtyTwo => 2,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            StepCount::Sixteen => StepCount::ThirtyTwo,
            StepCount::ThirtyTwo => StepCount::Sixteen,
        }
    }
}

/// Time between dispatches: one full pattern pass at `tempo`.
///
/// `(60 / bpm) * 4 * bars` seconds.
pub fn dispatch_interval(tempo: Tempo, steps: StepCount) -> Duration {
    let secs = 60.0 / tempo.bpm() as f64 * 4.0 * steps.bars() as f64;
    Duration::from_secs_f64(secs)
}
