//! Hardware MIDI input

#[cfg(feature = "midi")]
mod input;
mod mapping;

#[cfg(feature = "midi")]
pub use input::*;
pub use mapping::*;

use showbridge_core::ExecutorNumber;

/// MIDI channel messages the bridge reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MidiMessage {
    NoteOn {
        channel: u8,
        note: u8,
        velocity: u8,
    },
    NoteOff {
        channel: u8,
        note: u8,
    },
    ControlChange {
        channel: u8,
        controller: u8,
        value: u8,
    },
}

impl MidiMessage {
    /// Parse a MIDI message from raw bytes.
    ///
    /// Returns `None` for truncated messages and for anything other than
    /// note and control change messages.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let (&status, data) = bytes.split_first()?;
        let channel = status & 0x0F;

        match (status & 0xF0, data) {
            (0x90, [note, 0, ..]) => {
                // Note On with velocity 0 is treated as Note Off
                Some(MidiMessage::NoteOff {
                    channel,
                    note: *note,
                })
            }
            (0x90, [note, velocity, ..]) => Some(MidiMessage::NoteOn {
                channel,
                note: *note,
                velocity: *velocity,
            }),
            (0x80, [note, ..]) => Some(MidiMessage::NoteOff {
                channel,
                note: *note,
            }),
            (0xB0, [controller, value, ..]) => Some(MidiMessage::ControlChange {
                channel,
                controller: *controller,
                value: *value,
            }),
            _ => None,
        }
    }
}

/// A key press or release on the hardware controller, already resolved to an
/// executor. A velocity of 0 is a release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MidiNoteEvent {
    /// Logical executor number
    pub executor: ExecutorNumber,
    /// Note velocity, 0 for Note Off
    pub velocity: u8,
}

impl MidiNoteEvent {
    /// Resolve a parsed message to an executor event.
    ///
    /// Control changes and notes below the mapped range yield `None`.
    pub fn from_message(message: &MidiMessage) -> Option<Self> {
        let (note, velocity) = match *message {
            MidiMessage::NoteOn { note, velocity, .. } => (note, velocity),
            MidiMessage::NoteOff { note, .. } => (note, 0),
            MidiMessage::ControlChange { .. } => return None,
        };
        note_to_executor(note).map(|executor| MidiNoteEvent { executor, velocity })
    }
}
