//! MIDI wire types shared by the engine and the output backends.

use serde::{Deserialize, Serialize};

/// MIDI channel, stored 0-based (0..=15).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct MidiChannel(u8);

impl MidiChannel {
    /// Values above 15 are clamped.
    pub fn new(channel: u8) -> Self {
        Self(channel.min(15))
    }

    /// From the 1..=16 numbering shown to users.
    pub fn from_display(channel: u8) -> Self {
        Self::new(channel.clamp(1, 16) - 1)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn display(self) -> u8 {
        self.0 + 1
    }

    pub fn offset(self, delta: i32) -> Self {
        Self((self.0 as i32 + delta).clamp(0, 15) as u8)
    }
}

/// A Program Change message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProgramChange {
    pub channel: MidiChannel,
    pub program: u8,
}

impl ProgramChange {
    pub fn new(channel: MidiChannel, program: u8) -> Self {
        Self { channel, program }
    }

    /// `[0xC0 | channel, program]`
    pub fn to_bytes(&self) -> [u8; 2] {
        [0xC0 | (self.channel.get() & 0x0F), self.program & 0x7F]
    }
}

/// Host-reported state of an output port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionState {
    Connected,
    Disconnected,
}

/// One entry of an output enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputPort {
    pub id: String,
    pub name: String,
    pub state: ConnectionState,
}

impl OutputPort {
    pub fn connected(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            state: ConnectionState::Connected,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn program_change_bytes() {
        let pc = ProgramChange::new(MidiChannel::new(0), 5);
        assert_eq!(pc.to_bytes(), [0xC0, 5]);
        let pc = ProgramChange::new(MidiChannel::new(9), 63);
        assert_eq!(pc.to_bytes(), [0xC9, 63]);
    }

    #[test]
    fn program_is_masked_to_seven_bits() {
        let pc = ProgramChange::new(MidiChannel::new(0), 200);
        assert_eq!(pc.to_bytes()[1], 200 & 0x7F);
    }

    #[test]
    fn channel_numbering() {
        assert_eq!(MidiChannel::new(20).get(), 15);
        assert_eq!(MidiChannel::from_display(1).get(), 0);
        assert_eq!(MidiChannel::from_display(16).get(), 15);
        assert_eq!(MidiChannel::from_display(0).get(), 0);
        assert_eq!(MidiChannel::new(3).display(), 4);
        assert_eq!(MidiChannel::new(0).offset(-1).get(), 0);
        assert_eq!(MidiChannel::new(15).offset(1).get(), 15);
    }
}
