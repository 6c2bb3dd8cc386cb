//! Packed storage for timestamped MIDI messages.
//!
//! Messages live back-to-back in one contiguous byte region: an 8-byte
//! little-endian sample timestamp, a 2-byte little-endian payload length,
//! then the raw message bytes. One allocation serves the whole buffer, so
//! clearing and refilling it every processing block stays cheap.

use core::fmt;

use midi_msg::MidiMsg;
use smallvec::SmallVec;

use crate::error::{Error, Result};
use crate::message;

const TIMESTAMP_BYTES: usize = 8;
const LENGTH_BYTES: usize = 2;
const HEADER_BYTES: usize = TIMESTAMP_BYTES + LENGTH_BYTES;

/// Longest message a single record can hold.
pub const MAX_MESSAGE_BYTES: usize = u16::MAX as usize;

pub(crate) fn validate(message: &[u8]) -> Result<()> {
    if message.is_empty() {
        return Err(Error::EmptyMessage);
    }
    if message.len() > MAX_MESSAGE_BYTES {
        return Err(Error::MessageTooLong {
            len: message.len(),
            max: MAX_MESSAGE_BYTES,
        });
    }
    Ok(())
}

fn read_header(data: &[u8], offset: usize) -> Option<(i64, usize)> {
    let header = data.get(offset..offset + HEADER_BYTES)?;
    let mut ts = [0u8; TIMESTAMP_BYTES];
    ts.copy_from_slice(&header[..TIMESTAMP_BYTES]);
    let len = u16::from_le_bytes([header[TIMESTAMP_BYTES], header[TIMESTAMP_BYTES + 1]]);
    Some((i64::from_le_bytes(ts), len as usize))
}

fn write_record(data: &mut Vec<u8>, timestamp: i64, message: &[u8]) {
    data.extend_from_slice(&timestamp.to_le_bytes());
    data.extend_from_slice(&(message.len() as u16).to_le_bytes());
    data.extend_from_slice(message);
}

/// An ordered multiset of timestamped raw MIDI messages in packed storage.
///
/// Timestamps are integer sample offsets relative to whatever epoch the
/// caller uses (start of a file, first sample of the current block).
/// Iteration yields events in non-decreasing timestamp order as long as all
/// insertions went through [`add_event`](Self::add_event); after
/// [`push_event`](Self::push_event) bulk appends, call
/// [`sort_events`](Self::sort_events) before relying on the order.
///
/// A buffer is owned by one thread at a time. Cross-thread handoff swaps
/// whole buffers (see [`MidiExchange`](crate::MidiExchange)) instead of
/// sharing one for concurrent read and write.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct MidiEventBuffer {
    data: Vec<u8>,
    events: usize,
}

impl MidiEventBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty buffer with `bytes` of packed storage pre-allocated.
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            data: Vec::with_capacity(bytes),
            events: 0,
        }
    }

    /// Insert a message, keeping the buffer in timestamp order.
    ///
    /// The new event lands after any existing events with the same
    /// timestamp. Rejects empty messages and messages longer than
    /// [`MAX_MESSAGE_BYTES`]; on error the buffer is untouched.
    ///
    /// Insertion may reallocate the packed storage, which is why iteration
    /// borrows the buffer: an outstanding [`Events`] iterator makes
    /// mutation a compile error rather than a dangling view.
    pub fn add_event(&mut self, timestamp: i64, message: &[u8]) -> Result<()> {
        validate(message)?;
        let offset = self.insert_offset(timestamp);
        if offset == self.data.len() {
            self.append_record(timestamp, message);
            return Ok(());
        }
        let mut record: SmallVec<[u8; 32]> = SmallVec::new();
        record.extend_from_slice(&timestamp.to_le_bytes());
        record.extend_from_slice(&(message.len() as u16).to_le_bytes());
        record.extend_from_slice(message);
        self.data.splice(offset..offset, record.iter().copied());
        self.events += 1;
        Ok(())
    }

    /// Append a message without looking at timestamps.
    ///
    /// Meant for bulk loading already-ordered data, or for loading unordered
    /// data followed by one [`sort_events`](Self::sort_events). Mixing this
    /// with ordered iteration and no re-sort yields whatever order the
    /// appends happened in.
    pub fn push_event(&mut self, timestamp: i64, message: &[u8]) -> Result<()> {
        validate(message)?;
        self.append_record(timestamp, message);
        Ok(())
    }

    /// Restore timestamp order after out-of-order
    /// [`push_event`](Self::push_event) appends.
    ///
    /// Stable: events with equal timestamps keep their append order, the
    /// same rule [`add_event`](Self::add_event) and
    /// [`merge_from`](Self::merge_from) follow.
    pub fn sort_events(&mut self) {
        let mut spans: SmallVec<[(i64, usize, usize); 32]> = SmallVec::new();
        let mut offset = 0;
        while let Some((timestamp, len)) = read_header(&self.data, offset) {
            let total = HEADER_BYTES + len;
            spans.push((timestamp, offset, total));
            offset += total;
        }
        if spans.windows(2).all(|pair| pair[0].0 <= pair[1].0) {
            return;
        }
        spans.sort_by_key(|&(timestamp, _, _)| timestamp);

        let mut sorted = Vec::with_capacity(self.data.len());
        for &(_, offset, total) in &spans {
            sorted.extend_from_slice(&self.data[offset..offset + total]);
        }
        self.data = sorted;
    }

    /// Discard all events. Backing storage is retained for reuse across
    /// processing blocks.
    pub fn clear(&mut self) {
        self.data.clear();
        self.events = 0;
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events == 0
    }

    /// Number of events. O(1).
    #[inline]
    pub fn len(&self) -> usize {
        self.events
    }

    /// Bytes of packed storage currently in use.
    #[inline]
    pub fn bytes_used(&self) -> usize {
        self.data.len()
    }

    /// Timestamp of the first event, if any.
    pub fn first_timestamp(&self) -> Option<i64> {
        read_header(&self.data, 0).map(|(timestamp, _)| timestamp)
    }

    /// Timestamp of the last event, if any.
    pub fn last_timestamp(&self) -> Option<i64> {
        self.iter().last().map(|event| event.timestamp)
    }

    /// Iterate the packed storage from the start.
    ///
    /// Lazy and restartable; each call walks the records from the
    /// beginning. Returns `(timestamp, message bytes)` views without
    /// copying.
    pub fn iter(&self) -> Events<'_> {
        Events {
            data: &self.data,
            offset: 0,
        }
    }

    /// Copy out the events whose timestamp falls in
    /// `[start_sample, start_sample + num_samples)`, re-timestamped relative
    /// to `start_sample`, preserving order.
    ///
    /// This is the per-block slicing step when playing a long pre-recorded
    /// buffer: each callback extracts its own window with timestamps
    /// relative to the block's first sample.
    pub fn extract_range(&self, start_sample: i64, num_samples: i64) -> MidiEventBuffer {
        let mut out = MidiEventBuffer::new();
        let end = start_sample.saturating_add(num_samples.max(0));
        for event in self.iter() {
            if event.timestamp >= end {
                break;
            }
            if event.timestamp >= start_sample {
                out.append_record(event.timestamp - start_sample, event.bytes);
            }
        }
        out
    }

    /// Merge another ordered buffer into this one by a two-pointer merge.
    ///
    /// Stable, with a fixed tie-break: for equal timestamps, events already
    /// in `self` come before events from `other`, and each side keeps its
    /// own internal order.
    pub fn merge_from(&mut self, other: &MidiEventBuffer) {
        if other.is_empty() {
            return;
        }
        if self.is_empty() {
            self.data.clear();
            self.data.extend_from_slice(&other.data);
            self.events = other.events;
            return;
        }

        let mut merged = Vec::with_capacity(self.data.len() + other.data.len());
        {
            let mut ours = self.iter().peekable();
            let mut theirs = other.iter().peekable();
            loop {
                let take_ours = match (ours.peek(), theirs.peek()) {
                    (Some(a), Some(b)) => a.timestamp <= b.timestamp,
                    (Some(_), None) => true,
                    (None, Some(_)) => false,
                    (None, None) => break,
                };
                let event = if take_ours { ours.next() } else { theirs.next() };
                if let Some(event) = event {
                    write_record(&mut merged, event.timestamp, event.bytes);
                }
            }
        }
        self.data = merged;
        self.events += other.events;
    }

    /// Append a validated record at the end. Caller keeps order intact.
    pub(crate) fn append_record(&mut self, timestamp: i64, message: &[u8]) {
        self.data.reserve(HEADER_BYTES + message.len());
        write_record(&mut self.data, timestamp, message);
        self.events += 1;
    }

    /// Byte offset at which a new event with `timestamp` belongs: right
    /// before the first event with a strictly greater timestamp.
    fn insert_offset(&self, timestamp: i64) -> usize {
        let mut offset = 0;
        while let Some((existing, len)) = read_header(&self.data, offset) {
            if existing > timestamp {
                return offset;
            }
            offset += HEADER_BYTES + len;
        }
        self.data.len()
    }
}

impl fmt::Debug for MidiEventBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MidiEventBuffer")
            .field("events", &self.events)
            .field("bytes_used", &self.data.len())
            .finish()
    }
}

impl<'a> IntoIterator for &'a MidiEventBuffer {
    type Item = EventRef<'a>;
    type IntoIter = Events<'a>;

    fn into_iter(self) -> Events<'a> {
        self.iter()
    }
}

/// A borrowed view of one event in a [`MidiEventBuffer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EventRef<'a> {
    /// Sample offset relative to the buffer's epoch.
    pub timestamp: i64,
    /// Raw message bytes.
    pub bytes: &'a [u8],
}

impl EventRef<'_> {
    #[inline]
    pub fn status(&self) -> Option<u8> {
        message::status(self.bytes)
    }

    #[inline]
    pub fn channel(&self) -> Option<u8> {
        message::channel(self.bytes)
    }

    #[inline]
    pub fn is_note_on(&self) -> bool {
        message::is_note_on(self.bytes)
    }

    #[inline]
    pub fn is_note_off(&self) -> bool {
        message::is_note_off(self.bytes)
    }

    #[inline]
    pub fn note(&self) -> Option<u8> {
        message::note(self.bytes)
    }

    /// Decode into a structured `midi-msg` message.
    pub fn to_msg(&self) -> Option<MidiMsg> {
        message::parse(self.bytes)
    }
}

/// Iterator over the packed records of a [`MidiEventBuffer`].
///
/// Advances by decoding each record's length header. Decoding is
/// bounds-checked against the stored byte count, so a record that would run
/// past the end terminates iteration instead of reading out of range.
pub struct Events<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Iterator for Events<'a> {
    type Item = EventRef<'a>;

    fn next(&mut self) -> Option<EventRef<'a>> {
        let (timestamp, len) = read_header(self.data, self.offset)?;
        let start = self.offset + HEADER_BYTES;
        let bytes = self.data.get(start..start + len)?;
        self.offset = start + len;
        Some(EventRef { timestamp, bytes })
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn events() -> impl Strategy<Value = Vec<(i64, Vec<u8>)>> {
        prop::collection::vec(
            (
                -1000i64..1000,
                prop::collection::vec(any::<u8>(), 1..8),
            ),
            0..64,
        )
    }

    fn multiset(buffer: &MidiEventBuffer) -> BTreeMap<(i64, Vec<u8>), usize> {
        let mut set = BTreeMap::new();
        for event in buffer.iter() {
            *set.entry((event.timestamp, event.bytes.to_vec())).or_insert(0) += 1;
        }
        set
    }

    proptest! {
        /// Any sequence of ordered inserts iterates in non-decreasing
        /// timestamp order and loses nothing.
        #[test]
        fn add_event_keeps_order(entries in events()) {
            let mut buffer = MidiEventBuffer::new();
            let mut expected = BTreeMap::new();
            for (timestamp, message) in &entries {
                buffer.add_event(*timestamp, message).unwrap();
                *expected.entry((*timestamp, message.clone())).or_insert(0) += 1;
            }

            prop_assert_eq!(buffer.len(), entries.len());
            let stamps: Vec<i64> = buffer.iter().map(|e| e.timestamp).collect();
            prop_assert!(stamps.windows(2).all(|pair| pair[0] <= pair[1]));
            prop_assert_eq!(multiset(&buffer), expected);
        }

        /// Merging two ordered buffers yields the exact multiset union,
        /// ordered, with length M + N.
        #[test]
        fn merge_is_ordered_multiset_union(
            left in events(),
            right in events(),
        ) {
            let mut a = MidiEventBuffer::new();
            for (timestamp, message) in &left {
                a.add_event(*timestamp, message).unwrap();
            }
            let mut b = MidiEventBuffer::new();
            for (timestamp, message) in &right {
                b.add_event(*timestamp, message).unwrap();
            }

            let mut expected = multiset(&a);
            for (key, count) in multiset(&b) {
                *expected.entry(key).or_insert(0) += count;
            }

            a.merge_from(&b);
            prop_assert_eq!(a.len(), left.len() + right.len());
            let stamps: Vec<i64> = a.iter().map(|e| e.timestamp).collect();
            prop_assert!(stamps.windows(2).all(|pair| pair[0] <= pair[1]));
            prop_assert_eq!(multiset(&a), expected);
        }

        /// push_event then sort_events agrees with add_event ordering.
        #[test]
        fn bulk_append_then_sort_matches_ordered_insert(entries in events()) {
            let mut bulk = MidiEventBuffer::new();
            for (timestamp, message) in &entries {
                bulk.push_event(*timestamp, message).unwrap();
            }
            bulk.sort_events();

            let stamps: Vec<i64> = bulk.iter().map(|e| e.timestamp).collect();
            prop_assert!(stamps.windows(2).all(|pair| pair[0] <= pair[1]));
            prop_assert_eq!(bulk.len(), entries.len());
        }
    }
}
