use std::time::{Duration, Instant};

use pcdice_types::NoticeLevel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warning,
}

impl StatusLevel {
    fn ttl(self) -> Duration {
        match self {
            StatusLevel::Info => Duration::from_secs(3),
            StatusLevel::Warning => Duration::from_secs(5),
        }
    }
}

impl From<NoticeLevel> for StatusLevel {
    fn from(level: NoticeLevel) -> Self {
        match level {
            NoticeLevel::Info => StatusLevel::Info,
            NoticeLevel::Warning => StatusLevel::Warning,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub level: StatusLevel,
    pub timestamp: Instant,
}

impl StatusMessage {
    fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.timestamp) > self.level.ttl()
    }
}

pub struct StatusBar {
    messages: Vec<StatusMessage>,
    max: usize,
}

impl StatusBar {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            max: 32,
        }
    }

    pub fn push(&mut self, text: impl Into<String>, level: StatusLevel) {
        self.push_at(text, level, Instant::now());
    }

    fn push_at(&mut self, text: impl Into<String>, level: StatusLevel, timestamp: Instant) {
        self.messages.push(StatusMessage {
            text: text.into(),
            level,
            timestamp,
        });
        if self.messages.len() > self.max {
            self.messages.remove(0);
        }
    }

    /// Returns the most recent non-expired message, if any.
    pub fn current(&self) -> Option<&StatusMessage> {
        self.current_at(Instant::now())
    }

    fn current_at(&self, now: Instant) -> Option<&StatusMessage> {
        self.messages.iter().rev().find(|m| !m.is_expired(now))
    }
}

impl Default for StatusBar {
    fn default() -> Self {
        Self::new()
    }
}
