//! Error types for ostinato-midi.

use thiserror::Error;

/// Error type for MIDI buffer and sequence operations.
///
/// Only non-real-time entry points (insertion from parsers, editors) return
/// these; everything on the audio callback path is infallible by clamping.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("MIDI message is empty")]
    EmptyMessage,

    #[error("MIDI message of {len} bytes exceeds the {max}-byte record limit")]
    MessageTooLong { len: usize, max: usize },
}

/// Result type alias.
pub type Result<T> = core::result::Result<T, Error>;
