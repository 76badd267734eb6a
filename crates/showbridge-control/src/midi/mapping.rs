//! Note to executor mapping and per-type value derivation
//!
//! The controller's keys start at note 48 and are packed in groups of five:
//! the first 20 keys cover columns 1-5 of each executor row, the next 20
//! cover columns 6-10, and everything above maps linearly.

use showbridge_core::{ExecutorNumber, ExecutorType};

/// Lowest mapped note
pub const NOTE_OFFSET: u8 = 48;

/// Largest value a fader is driven to from a key press
pub const FADER_MAX: f32 = 0.9999;

/// Map a note number to its executor, `None` below [`NOTE_OFFSET`].
pub fn note_to_executor(note: u8) -> Option<ExecutorNumber> {
    let raw = ExecutorNumber::from(note.checked_sub(NOTE_OFFSET)?);
    let executor = if raw < 20 {
        (raw % 5) + (raw / 5) * 10 + 1
    } else if raw < 40 {
        (raw % 5) + ((raw - 20) / 5) * 10 + 6
    } else {
        raw + 1
    };
    Some(executor)
}

/// Derive the value to command for a key event.
///
/// `last` is the executor's current value and `velocity` 0 means release.
/// Returns `None` when the event must be ignored (release on a toggle).
pub fn derive_value(kind: ExecutorType, last: f32, velocity: u8) -> Option<f32> {
    match kind {
        ExecutorType::Fader => Some((f32::from(velocity) / 127.0).min(FADER_MAX)),
        ExecutorType::Toggle if velocity > 0 => Some(if last == 0.0 { 1.0 } else { 0.0 }),
        ExecutorType::Toggle => None,
        ExecutorType::Flash | ExecutorType::Other => Some(if velocity > 0 { 1.0 } else { 0.0 }),
    }
}
