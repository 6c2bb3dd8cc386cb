//! # Ostinato - real-time audio data path primitives
//!
//! Umbrella crate that coordinates:
//! - **ostinato-fifo** - SPSC FIFO index arithmetic and lock-free ring buffer
//! - **ostinato-midi** - Timestamped MIDI event buffers, sequences, and
//!   cross-thread handoff (feature: `midi`, on by default)
//!
//! ## Quick Start
//!
//! ```
//! use ostinato::prelude::*;
//!
//! // Samples cross the thread boundary through the lock-free ring.
//! let (mut producer, mut consumer) = RingBuffer::<f32>::with_capacity(512).split();
//! producer.push_slice(&[0.0, 0.25, 0.5]);
//!
//! let mut block = [0.0f32; 128];
//! let got = consumer.pop_slice(&mut block);
//! assert_eq!(got, 3);
//!
//! // MIDI crosses it as whole timestamped buffers.
//! let mut events = MidiEventBuffer::new();
//! events.add_event(0, &[0x90, 60, 100]).unwrap();
//! ```
//!
//! ## Feature Flags
//!
//! - `default` - FIFO core plus MIDI
//! - `midi` - MIDI event buffering subsystem

/// Re-export of ostinato-fifo for direct access
pub use ostinato_fifo as fifo;

// Core types
pub use ostinato_fifo::{Consumer, FifoIndexer, Producer, Regions, RingBuffer, Span};

// MIDI subsystem
#[cfg(feature = "midi")]
pub use ostinato_midi as midi;

#[cfg(feature = "midi")]
pub use ostinato_midi::{
    EventRef, MidiEventBuffer, MidiExchange, MidiSequence, TimedEvent,
};

/// Convenience prelude for common imports
pub mod prelude {
    pub use crate::{FifoIndexer, RingBuffer};

    #[cfg(feature = "midi")]
    pub use crate::{MidiEventBuffer, MidiExchange, MidiSequence};
}
