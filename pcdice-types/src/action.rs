//! Action types for the dispatch system.
//!
//! Actions represent operator intents. The UI resolves key presses into
//! actions; `pcdice-core` applies them to the engine.

use serde::{Deserialize, Serialize};

use crate::pattern::{BankIndex, SlotIndex};

/// Run lifecycle intents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportAction {
    /// Idle -> Waiting.
    Start,
    /// Waiting -> Running (first dispatch).
    Tap,
    /// Waiting -> Idle.
    Cancel,
    /// Running -> Idle.
    Stop,
    /// Dispatch now and re-anchor the timer.
    Resync,
    /// Single start/stop button: start, tap or stop depending on state.
    Toggle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatternAction {
    Toggle { bank: BankIndex, slot: SlotIndex },
    FillAll(BankIndex),
    FillNone(BankIndex),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimingAction {
    SetBpm(u16),
    AdjustBpm(i32),
    ToggleSteps,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputAction {
    Select(String),
    SelectNext,
    SelectPrev,
    AdjustChannel(i32),
}

/// Top-level action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    None,
    Quit,
    Transport(TransportAction),
    Pattern(PatternAction),
    Timing(TimingAction),
    Output(OutputAction),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticeLevel {
    Info,
    Warning,
}

/// Short operator-facing message produced by dispatch (e.g. why a start was refused).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// What the UI layer has to do after an action was applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchResult {
    pub quit: bool,
    pub notices: Vec<Notice>,
}

impl DispatchResult {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_quit() -> Self {
        Self {
            quit: true,
            ..Self::default()
        }
    }

    pub fn with_notice(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            notices: vec![Notice {
                level,
                message: message.into(),
            }],
            ..Self::default()
        }
    }

    pub fn push_notice(&mut self, level: NoticeLevel, message: impl Into<String>) {
        self.notices.push(Notice {
            level,
            message: message.into(),
        });
    }
}
