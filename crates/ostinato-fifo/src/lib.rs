//! Lock-free SPSC primitives for real-time audio.
//!
//! Two layers, leaf first:
//!
//! - [`FifoIndexer`]: pure index arithmetic over a fixed circular index
//!   space. Computes the one or two contiguous regions a caller should copy
//!   into or out of, without ever touching element data. Usable for any
//!   element type the caller stores in its own backing array.
//! - [`RingBuffer`]: a typed single-producer/single-consumer ring built on
//!   the indexer. [`RingBuffer::split`] hands out exactly one [`Producer`]
//!   and one [`Consumer`], so the SPSC contract is enforced by ownership.
//!
//! Everything here is wait-free, allocation-free after construction, and
//! safe to call from an audio callback. Error conditions on the hot path
//! clamp to the largest safe transfer instead of panicking.
//!
//! # Example
//!
//! ```
//! use ostinato_fifo::RingBuffer;
//!
//! let (mut producer, mut consumer) = RingBuffer::<f32>::with_capacity(8).split();
//!
//! assert_eq!(producer.push_slice(&[0.1, 0.2, 0.3]), 3);
//!
//! let mut block = [0.0; 4];
//! assert_eq!(consumer.pop_slice(&mut block), 3);
//! assert_eq!(&block[..3], &[0.1, 0.2, 0.3]);
//! ```

#![no_std]

#[macro_use]
extern crate alloc;

#[cfg(test)]
extern crate std;

/// Compatibility layer for no_std + alloc.
///
/// Re-exports common types that work in both std and no_std environments.
pub mod compat;

mod indexer;
pub use indexer::{FifoIndexer, Regions, Span};

mod ring;
pub use ring::{Consumer, Producer, RingBuffer};
