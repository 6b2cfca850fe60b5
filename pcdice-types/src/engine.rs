//! Engine lifecycle and dispatch outcome types.

use serde::{Deserialize, Serialize};

use crate::pattern::Candidate;

/// Lifecycle state of the dispatch engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EngineState {
    /// Nothing armed. Initial state, and where every run ends.
    #[default]
    Idle,
    /// Armed; waiting for the operator's tap to fire the first dispatch.
    Waiting,
    /// Periodic dispatch in progress.
    Running,
}

impl EngineState {
    pub fn is_idle(self) -> bool {
        self == EngineState::Idle
    }

    pub fn label(self) -> &'static str {
        match self {
            EngineState::Idle => "IDLE",
            EngineState::Waiting => "WAIT",
            EngineState::Running => "RUN",
        }
    }
}

/// Result of one dispatch attempt. Dispatching never changes engine state;
/// the caller decides the transition from this value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Message sent for this candidate.
    Ok(Candidate),
    /// No live output is selected.
    Disconnected,
    /// Every slot is disabled.
    NoPattern,
    /// The transport rejected the message.
    SendError(String),
}

impl DispatchOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, DispatchOutcome::Ok(_))
    }
}
