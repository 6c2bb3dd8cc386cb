//! Double-buffered MIDI handoff between threads.
//!
//! A non-real-time thread (UI, file loader, hardware input collector) fills
//! its own [`MidiEventBuffer`] and publishes it; the audio callback collects
//! the published buffer with an O(1) swap. The lock is held only for the
//! swap itself, never during processing, so the callback's worst case is
//! bounded by one pointer exchange.

use parking_lot::Mutex;
use tracing::debug;

use crate::buffer::MidiEventBuffer;

/// A single-slot exchange point for whole-buffer ownership transfer.
///
/// # Example
/// ```
/// use ostinato_midi::{MidiEventBuffer, MidiExchange};
///
/// let exchange = MidiExchange::new();
///
/// // UI side.
/// let mut pending = MidiEventBuffer::new();
/// pending.add_event(0, &[0x90, 60, 100]).unwrap();
/// exchange.publish(&mut pending);
/// assert!(pending.is_empty());
///
/// // Audio side, once per block.
/// let mut scratch = MidiEventBuffer::new();
/// exchange.collect(&mut scratch);
/// assert_eq!(scratch.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MidiExchange {
    slot: Mutex<MidiEventBuffer>,
}

impl MidiExchange {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand `pending`'s events to the consumer. Non-real-time side.
    ///
    /// When the slot is free this is a swap; when the consumer has not
    /// collected the previous batch yet, the batches are merged in
    /// timestamp order. Either way `pending` comes back empty with its
    /// storage intact for refilling.
    pub fn publish(&self, pending: &mut MidiEventBuffer) {
        let mut slot = self.slot.lock();
        if slot.is_empty() {
            core::mem::swap(&mut *slot, pending);
        } else {
            debug!(
                pending = pending.len(),
                queued = slot.len(),
                "previous batch not yet collected, merging"
            );
            slot.merge_from(pending);
        }
        drop(slot);
        pending.clear();
    }

    /// Take whatever has been published. Real-time side.
    ///
    /// O(1): swaps the slot with `out`, which must arrive cleared. The
    /// storage `out` brought in stays behind in the slot, so allocations
    /// recycle between the two sides instead of accumulating.
    pub fn collect(&self, out: &mut MidiEventBuffer) {
        let mut slot = self.slot.lock();
        core::mem::swap(&mut *slot, out);
    }

    /// Whether a published batch is waiting. Advisory.
    pub fn has_pending(&self) -> bool {
        !self.slot.lock().is_empty()
    }
}
