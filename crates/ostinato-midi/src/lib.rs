//! MIDI event buffering for the real-time audio path.
//!
//! Everything revolves around timestamped raw MIDI messages packed into
//! contiguous storage:
//!
//! - **Per-block buffers**: [`MidiEventBuffer`] holds one processing block's
//!   events in timestamp order, with splice-based ordered insertion, range
//!   extraction, and two-pointer merge
//! - **Sequences**: [`MidiSequence`] retains a whole recording and slices it
//!   into per-block windows non-destructively
//! - **Cross-thread handoff**: [`MidiExchange`] moves whole buffers between
//!   a non-real-time producer and the audio callback with a swap-only
//!   critical section
//! - **Raw message helpers**: [`message`] classifies message bytes without
//!   parsing; full decoding defers to `midi-msg`
//!
//! # Example
//!
//! ```
//! use ostinato_midi::MidiEventBuffer;
//!
//! let mut block = MidiEventBuffer::new();
//! block.add_event(64, &[0x80, 60, 0]).unwrap();
//! block.add_event(0, &[0x90, 60, 100]).unwrap();
//!
//! for event in &block {
//!     println!("{:>5}: {:02X?}", event.timestamp, event.bytes);
//! }
//! ```

// Error types
pub mod error;
pub use error::{Error, Result};

// Packed per-block event storage
mod buffer;
pub use buffer::{EventRef, Events, MidiEventBuffer, MAX_MESSAGE_BYTES};

// Retained sequences for playback
mod sequence;
pub use sequence::{MidiSequence, TimedEvent};

// Cross-thread buffer handoff
mod exchange;
pub use exchange::MidiExchange;

// Raw message byte helpers
pub mod message;

// Re-export essential upstream types (users shouldn't need to import
// midi-msg directly)
pub use midi_msg::{Channel, ChannelVoiceMsg, ControlChange, MidiMsg};
