//! Typed lock-free SPSC ring buffer built on [`FifoIndexer`].
//!
//! The indexer does the index math; this module owns the slots and moves
//! element data through `UnsafeCell` for zero-overhead access on both sides.
//! Safety is guaranteed by the SPSC invariant: splitting yields exactly one
//! [`Producer`] and one [`Consumer`], neither is `Clone`, and every transfer
//! takes `&mut self`.

use crate::compat::{Arc, Box, Vec};
use crate::indexer::{FifoIndexer, Span};
use core::cell::UnsafeCell;
use core::mem::MaybeUninit;

/// Fixed-capacity SPSC ring for `Copy` elements.
///
/// Split into its two halves before use:
///
/// ```
/// use ostinato_fifo::RingBuffer;
///
/// let (mut producer, mut consumer) = RingBuffer::<u32>::with_capacity(64).split();
/// producer.try_push(7).unwrap();
/// assert_eq!(consumer.try_pop(), Some(7));
/// ```
pub struct RingBuffer<T> {
    indexer: FifoIndexer,
    slots: Box<[UnsafeCell<MaybeUninit<T>>]>,
}

// SAFETY: slots are only touched through the Producer/Consumer halves. The
// producer writes slots covered by a prepare_write region before its
// commit_write publishes them; the consumer reads slots covered by a
// prepare_read region before its commit_read releases them. The indexer's
// release/acquire discipline on the occupancy counter orders those accesses,
// so no slot is ever accessed from both sides at once.
unsafe impl<T: Send> Send for RingBuffer<T> {}
unsafe impl<T: Send> Sync for RingBuffer<T> {}

impl<T: Copy> RingBuffer<T> {
    /// Allocate a ring holding up to `capacity` elements.
    ///
    /// This is the only allocation the ring ever performs.
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || UnsafeCell::new(MaybeUninit::uninit()));
        Self {
            indexer: FifoIndexer::new(capacity),
            slots: slots.into_boxed_slice(),
        }
    }

    /// Split into the producer and consumer halves.
    pub fn split(self) -> (Producer<T>, Consumer<T>) {
        let ring = Arc::new(self);
        (
            Producer {
                ring: Arc::clone(&ring),
            },
            Consumer { ring },
        )
    }

    /// Copy the first `span.len` elements of `values` into the slots the
    /// span covers.
    fn write_span(&self, span: Span, values: &[T]) {
        for (i, &value) in values[..span.len].iter().enumerate() {
            // SAFETY: slots in a prepared write region belong exclusively to
            // the producer until the matching commit_write.
            unsafe { (*self.slots[span.start + i].get()).write(value) };
        }
    }

    fn read_span(&self, span: Span, from: usize, out: &mut [T]) {
        for (i, slot) in out[from..from + span.len].iter_mut().enumerate() {
            // SAFETY: slots in a prepared read region were published by a
            // commit_write, and the acquire load inside prepare_read made
            // their contents visible to this thread.
            *slot = unsafe { (*self.slots[span.start + i].get()).as_ptr().read() };
        }
    }
}

/// Write half of a [`RingBuffer`]. Send it to the producing thread.
pub struct Producer<T> {
    ring: Arc<RingBuffer<T>>,
}

impl<T: Copy> Producer<T> {
    /// Push one element. Hands the value back if the ring is full.
    #[inline]
    pub fn try_push(&mut self, value: T) -> Result<(), T> {
        let regions = self.ring.indexer.prepare_write(1);
        if regions.is_empty() {
            return Err(value);
        }
        // SAFETY: the prepared slot is ours until commit_write below.
        unsafe { (*self.ring.slots[regions.first.start].get()).write(value) };
        self.ring.indexer.commit_write(1);
        Ok(())
    }

    /// Push as many elements from `values` as currently fit.
    ///
    /// Returns the number written; the remainder is silently refused rather
    /// than blocking.
    pub fn push_slice(&mut self, values: &[T]) -> usize {
        let regions = self.ring.indexer.prepare_write(values.len());
        self.ring.write_span(regions.first, values);
        self.ring
            .write_span(regions.second, &values[regions.first.len..]);
        self.ring.indexer.commit_write(regions.len());
        regions.len()
    }

    /// Free slots right now. Advisory, as with
    /// [`FifoIndexer::vacant_len`].
    #[inline]
    pub fn vacant_len(&self) -> usize {
        self.ring.indexer.vacant_len()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.ring.indexer.is_full()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.ring.indexer.capacity()
    }
}

/// Read half of a [`RingBuffer`]. Send it to the consuming thread.
pub struct Consumer<T> {
    ring: Arc<RingBuffer<T>>,
}

impl<T: Copy> Consumer<T> {
    /// Pop one element, or `None` when the ring is empty.
    #[inline]
    pub fn try_pop(&mut self) -> Option<T> {
        let regions = self.ring.indexer.prepare_read(1);
        if regions.is_empty() {
            return None;
        }
        // SAFETY: the prepared slot was published by the producer and is
        // ours until commit_read below.
        let value = unsafe {
            (*self.ring.slots[regions.first.start].get())
                .as_ptr()
                .read()
        };
        self.ring.indexer.commit_read(1);
        Some(value)
    }

    /// Pop up to `out.len()` elements into `out`, returning how many were
    /// available.
    pub fn pop_slice(&mut self, out: &mut [T]) -> usize {
        let regions = self.ring.indexer.prepare_read(out.len());
        self.ring.read_span(regions.first, 0, out);
        self.ring.read_span(regions.second, regions.first.len, out);
        self.ring.indexer.commit_read(regions.len());
        regions.len()
    }

    /// Elements ready right now. Advisory, as with
    /// [`FifoIndexer::occupied_len`].
    #[inline]
    pub fn occupied_len(&self) -> usize {
        self.ring.indexer.occupied_len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ring.indexer.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.ring.indexer.capacity()
    }
}
