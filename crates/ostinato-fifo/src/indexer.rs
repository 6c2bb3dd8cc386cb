//! Index arithmetic for a fixed-capacity SPSC circular buffer.
//!
//! The indexer never touches element data. A caller that owns a backing
//! array asks for write (or read) regions, copies element data itself, then
//! commits the transfer. Exactly one producer thread may use the write pair
//! and exactly one consumer thread the read pair, concurrently, with no
//! locking: each cursor is mutated only by its owning side, and the `used`
//! counter is the publication point between them.

use crate::compat::{AtomicUsize, Ordering};

/// One contiguous index range within the caller's backing array.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub len: usize,
}

impl Span {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Borrow the covered range of a caller-owned slice.
    #[inline]
    pub fn of<'a, T>(&self, data: &'a [T]) -> &'a [T] {
        &data[self.start..self.start + self.len]
    }

    /// Mutably borrow the covered range of a caller-owned slice.
    #[inline]
    pub fn of_mut<'a, T>(&self, data: &'a mut [T]) -> &'a mut [T] {
        &mut data[self.start..self.start + self.len]
    }
}

/// Up to two contiguous ranges describing a prepared transfer.
///
/// `second` is non-empty only when the transfer straddles the end of the
/// backing array and wraps back to index 0.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Regions {
    pub first: Span,
    pub second: Span,
}

impl Regions {
    /// Total number of elements covered by both spans.
    #[inline]
    pub fn len(&self) -> usize {
        self.first.len + self.second.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cache-line aligned counter so the producer-side and consumer-side state
/// never false-share.
#[derive(Debug, Default)]
#[repr(align(64))]
struct AlignedCounter(AtomicUsize);

/// Pure index bookkeeping for a single-producer/single-consumer FIFO.
///
/// A full buffer is indistinguishable from an empty one using raw modulo
/// cursors, so occupancy is tracked as an explicit counter updated by
/// whichever side commits a transfer, never derived from cursor subtraction.
///
/// Invariant: `0 <= occupied_len() <= capacity()` at all times, for any
/// interleaving of one producer and one consumer.
///
/// # Example
///
/// ```
/// use ostinato_fifo::FifoIndexer;
///
/// let fifo = FifoIndexer::new(16);
/// let mut storage = [0u32; 16];
///
/// let regions = fifo.prepare_write(3);
/// regions.first.of_mut(&mut storage).copy_from_slice(&[7, 8, 9]);
/// fifo.commit_write(regions.len());
///
/// let regions = fifo.prepare_read(3);
/// assert_eq!(regions.first.of(&storage), &[7, 8, 9]);
/// fifo.commit_read(regions.len());
/// ```
#[derive(Debug)]
pub struct FifoIndexer {
    capacity: usize,
    write_pos: AlignedCounter,
    read_pos: AlignedCounter,
    used: AlignedCounter,
}

impl FifoIndexer {
    /// Create an indexer for a backing array of `capacity` elements.
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "fifo capacity must be positive");
        Self {
            capacity,
            write_pos: AlignedCounter::default(),
            read_pos: AlignedCounter::default(),
            used: AlignedCounter::default(),
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of elements the producer may currently write.
    ///
    /// Advisory: stale the instant the consumer commits a read. Useful for
    /// sizing the next prepare call, not as a synchronization mechanism.
    #[inline]
    pub fn vacant_len(&self) -> usize {
        self.capacity - self.used.0.load(Ordering::Acquire)
    }

    /// Number of elements ready for the consumer. Advisory, like
    /// [`vacant_len`](Self::vacant_len).
    #[inline]
    pub fn occupied_len(&self) -> usize {
        self.used.0.load(Ordering::Acquire)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.occupied_len() == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.occupied_len() == self.capacity
    }

    /// Compute where up to `wanted` elements may be written.
    ///
    /// The result is clamped to the current free space; it is empty when
    /// the buffer is full. No cursor moves until
    /// [`commit_write`](Self::commit_write), so a caller that abandons the
    /// transfer leaves the fifo unchanged.
    ///
    /// Producer side only.
    #[inline]
    pub fn prepare_write(&self, wanted: usize) -> Regions {
        let n = wanted.min(self.vacant_len());
        self.regions_from(self.write_pos.0.load(Ordering::Relaxed), n)
    }

    /// Publish `written` elements filled in after a
    /// [`prepare_write`](Self::prepare_write).
    ///
    /// `written` must not exceed the prepared count; a violation is clamped
    /// to the free space rather than corrupting the occupancy count, since
    /// this runs on the real-time path where panicking is not an option.
    ///
    /// Producer side only.
    #[inline]
    pub fn commit_write(&self, written: usize) {
        let n = written.min(self.vacant_len());
        if n == 0 {
            return;
        }
        let pos = self.write_pos.0.load(Ordering::Relaxed);
        self.write_pos
            .0
            .store((pos + n) % self.capacity, Ordering::Relaxed);
        // Release publishes the slot contents to the consumer's next
        // acquire load of `used`.
        self.used.0.fetch_add(n, Ordering::Release);
    }

    /// Compute where up to `wanted` elements may be read from.
    ///
    /// Clamped to the current occupancy; empty when the buffer is empty.
    /// Mutates nothing until [`commit_read`](Self::commit_read).
    ///
    /// Consumer side only.
    #[inline]
    pub fn prepare_read(&self, wanted: usize) -> Regions {
        let n = wanted.min(self.occupied_len());
        self.regions_from(self.read_pos.0.load(Ordering::Relaxed), n)
    }

    /// Release `read` elements consumed after a
    /// [`prepare_read`](Self::prepare_read). Over-commits clamp, as with
    /// [`commit_write`](Self::commit_write).
    ///
    /// Consumer side only.
    #[inline]
    pub fn commit_read(&self, read: usize) {
        let n = read.min(self.occupied_len());
        if n == 0 {
            return;
        }
        let pos = self.read_pos.0.load(Ordering::Relaxed);
        self.read_pos
            .0
            .store((pos + n) % self.capacity, Ordering::Relaxed);
        // Release hands the slots back to the producer's next acquire load.
        self.used.0.fetch_sub(n, Ordering::Release);
    }

    /// Zero both cursors and the occupancy count.
    ///
    /// Not itself synchronized: the caller must guarantee that no producer
    /// or consumer touches the fifo for the duration of this call.
    pub fn reset(&self) {
        self.write_pos.0.store(0, Ordering::Relaxed);
        self.read_pos.0.store(0, Ordering::Relaxed);
        self.used.0.store(0, Ordering::Release);
    }

    fn regions_from(&self, start: usize, n: usize) -> Regions {
        let first_len = n.min(self.capacity - start);
        Regions {
            first: Span {
                start,
                len: first_len,
            },
            second: Span {
                start: 0,
                len: n - first_len,
            },
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::VecDeque;
    use std::vec::Vec;

    #[derive(Clone, Debug)]
    enum Op {
        Write(usize),
        Read(usize),
    }

    fn ops() -> impl Strategy<Value = Vec<Op>> {
        prop::collection::vec(
            prop_oneof![
                (0usize..20).prop_map(Op::Write),
                (0usize..20).prop_map(Op::Read),
            ],
            1..200,
        )
    }

    proptest! {
        /// Against a queue model: occupancy stays within bounds and every
        /// element comes back exactly once, in write order, regardless of
        /// how prepare/commit pairs interleave or where the cursors wrap.
        #[test]
        fn fifo_matches_queue_model(capacity in 1usize..32, ops in ops()) {
            let fifo = FifoIndexer::new(capacity);
            let mut storage = vec![0u64; capacity];
            let mut model: VecDeque<u64> = VecDeque::new();
            let mut next_value = 0u64;

            for op in ops {
                match op {
                    Op::Write(n) => {
                        let regions = fifo.prepare_write(n);
                        prop_assert!(regions.len() <= n);
                        prop_assert!(regions.len() <= capacity - model.len());
                        for span in [regions.first, regions.second] {
                            for slot in span.of_mut(&mut storage) {
                                *slot = next_value;
                                model.push_back(next_value);
                                next_value += 1;
                            }
                        }
                        fifo.commit_write(regions.len());
                    }
                    Op::Read(n) => {
                        let regions = fifo.prepare_read(n);
                        prop_assert!(regions.len() <= n);
                        prop_assert!(regions.len() <= model.len());
                        for span in [regions.first, regions.second] {
                            for slot in span.of(&storage) {
                                prop_assert_eq!(Some(*slot), model.pop_front());
                            }
                        }
                        fifo.commit_read(regions.len());
                    }
                }
                prop_assert!(fifo.occupied_len() <= capacity);
                prop_assert_eq!(fifo.occupied_len(), model.len());
                prop_assert_eq!(fifo.vacant_len(), capacity - model.len());
            }
        }
    }
}
