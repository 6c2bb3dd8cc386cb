//! Retained MIDI sequences for block-by-block playback.
//!
//! Unlike [`MidiEventBuffer`], which is cleared every processing block, a
//! sequence holds a whole recording and is polled non-destructively: the
//! poll cursor advances but events are never consumed, so the same sequence
//! can be replayed any number of times after a [`reset`](MidiSequence::reset).

use core::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};

use crate::buffer::{validate, MidiEventBuffer};
use crate::error::Result;

/// One owned timestamped message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedEvent {
    /// Sample offset from the sequence's start.
    pub timestamp: i64,
    /// Raw message bytes.
    pub message: Vec<u8>,
}

/// A timestamp-sorted sequence of owned MIDI events.
///
/// `poll_range` uses an atomic cursor so it can take `&self` (RT-safe once
/// the sequence has been built).
///
/// # Example
/// ```
/// use ostinato_midi::{MidiEventBuffer, MidiSequence};
///
/// let mut sequence = MidiSequence::new();
/// sequence.add_event(0, &[0x90, 60, 100]).unwrap();
/// sequence.add_event(256, &[0x80, 60, 0]).unwrap();
///
/// // First block of 128 samples gets the note on.
/// let mut block = MidiEventBuffer::new();
/// assert_eq!(sequence.poll_range(0, 128, &mut block), 1);
///
/// // Rewind and the same events play again.
/// sequence.reset();
/// block.clear();
/// assert_eq!(sequence.poll_range(0, 128, &mut block), 1);
/// ```
#[derive(Debug, Default)]
pub struct MidiSequence {
    /// Events sorted by timestamp.
    events: Vec<TimedEvent>,
    /// Poll cursor (index into `events`). Atomic so `poll_range` can
    /// advance without `&mut self`.
    cursor: AtomicUsize,
}

impl Clone for MidiSequence {
    fn clone(&self) -> Self {
        Self {
            events: self.events.clone(),
            cursor: AtomicUsize::new(self.cursor.load(Ordering::Relaxed)),
        }
    }
}

impl MidiSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a message, keeping the sequence sorted. A new event lands
    /// after existing events with the same timestamp.
    pub fn add_event(&mut self, timestamp: i64, message: &[u8]) -> Result<()> {
        validate(message)?;
        let index = self
            .events
            .partition_point(|event| event.timestamp <= timestamp);
        self.events.insert(
            index,
            TimedEvent {
                timestamp,
                message: message.to_vec(),
            },
        );
        Ok(())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Timestamp of the final event, if any.
    pub fn last_timestamp(&self) -> Option<i64> {
        self.events.last().map(|event| event.timestamp)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimedEvent> {
        self.events.iter()
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.cursor.store(0, Ordering::Relaxed);
    }

    /// Append the events in `[start_sample, start_sample + num_samples)` to
    /// `out`, re-timestamped relative to `start_sample`, advancing the poll
    /// cursor past them. Returns how many events were appended.
    ///
    /// Events before `start_sample` that the cursor has not passed yet are
    /// skipped, so seeking forward is just polling from the new position.
    pub fn poll_range(
        &self,
        start_sample: i64,
        num_samples: i64,
        out: &mut MidiEventBuffer,
    ) -> usize {
        let end = start_sample.saturating_add(num_samples.max(0));
        let mut position = self.cursor.load(Ordering::Relaxed);
        let mut appended = 0;

        while position < self.events.len() && self.events[position].timestamp < start_sample {
            position += 1;
        }

        while position < self.events.len() && self.events[position].timestamp < end {
            let event = &self.events[position];
            if out
                .add_event(event.timestamp - start_sample, &event.message)
                .is_ok()
            {
                appended += 1;
            }
            position += 1;
        }

        self.cursor.store(position, Ordering::Relaxed);
        appended
    }

    /// Rewind the poll cursor to the beginning for replay.
    pub fn reset(&self) {
        self.cursor.store(0, Ordering::Relaxed);
    }

    /// Build a sequence from an ordered event buffer.
    pub fn from_buffer(buffer: &MidiEventBuffer) -> Self {
        let events = buffer
            .iter()
            .map(|event| TimedEvent {
                timestamp: event.timestamp,
                message: event.bytes.to_vec(),
            })
            .collect();
        Self {
            events,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Pack the whole sequence into an event buffer.
    pub fn to_buffer(&self) -> MidiEventBuffer {
        let mut buffer = MidiEventBuffer::new();
        for event in &self.events {
            buffer.append_record(event.timestamp, &event.message);
        }
        buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    const NOTE_ON: [u8; 3] = [0x90, 60, 100];
    const NOTE_OFF: [u8; 3] = [0x80, 60, 0];

    #[test]
    fn test_add_keeps_sorted() {
        let mut sequence = MidiSequence::new();
        sequence.add_event(300, &NOTE_OFF).unwrap();
        sequence.add_event(0, &NOTE_ON).unwrap();
        sequence.add_event(150, &NOTE_ON).unwrap();

        let stamps: Vec<i64> = sequence.iter().map(|e| e.timestamp).collect();
        assert_eq!(stamps, vec![0, 150, 300]);
    }

    #[test]
    fn test_rejects_empty_message() {
        let mut sequence = MidiSequence::new();
        assert_eq!(sequence.add_event(0, &[]), Err(Error::EmptyMessage));
        assert!(sequence.is_empty());
    }

    #[test]
    fn test_poll_range_blocks() {
        let mut sequence = MidiSequence::new();
        sequence.add_event(0, &NOTE_ON).unwrap();
        sequence.add_event(100, &NOTE_ON).unwrap();
        sequence.add_event(130, &NOTE_OFF).unwrap();
        sequence.add_event(400, &NOTE_OFF).unwrap();

        let mut block = MidiEventBuffer::new();

        // Block one: samples [0, 128).
        assert_eq!(sequence.poll_range(0, 128, &mut block), 2);
        let stamps: Vec<i64> = block.iter().map(|e| e.timestamp).collect();
        assert_eq!(stamps, vec![0, 100]);

        // Block two: samples [128, 256), timestamps relative to 128.
        block.clear();
        assert_eq!(sequence.poll_range(128, 128, &mut block), 1);
        assert_eq!(block.first_timestamp(), Some(2));

        // Block three: nothing until sample 400.
        block.clear();
        assert_eq!(sequence.poll_range(256, 128, &mut block), 0);

        block.clear();
        assert_eq!(sequence.poll_range(384, 128, &mut block), 1);
        assert_eq!(block.first_timestamp(), Some(16));
    }

    #[test]
    fn test_poll_does_not_consume() {
        let mut sequence = MidiSequence::new();
        sequence.add_event(10, &NOTE_ON).unwrap();

        let mut block = MidiEventBuffer::new();
        assert_eq!(sequence.poll_range(0, 64, &mut block), 1);

        // Cursor advanced: polling the same window again yields nothing.
        block.clear();
        assert_eq!(sequence.poll_range(0, 64, &mut block), 0);

        // Reset and the event plays again.
        sequence.reset();
        block.clear();
        assert_eq!(sequence.poll_range(0, 64, &mut block), 1);
        assert_eq!(sequence.len(), 1);
    }

    #[test]
    fn test_buffer_round_trip() {
        let mut sequence = MidiSequence::new();
        sequence.add_event(0, &NOTE_ON).unwrap();
        sequence.add_event(480, &NOTE_OFF).unwrap();

        let buffer = sequence.to_buffer();
        assert_eq!(buffer.len(), 2);

        let back = MidiSequence::from_buffer(&buffer);
        assert_eq!(back.len(), 2);
        assert_eq!(back.last_timestamp(), Some(480));
    }

    #[test]
    fn test_clone_keeps_cursor() {
        let mut sequence = MidiSequence::new();
        sequence.add_event(0, &NOTE_ON).unwrap();
        sequence.add_event(200, &NOTE_OFF).unwrap();

        let mut block = MidiEventBuffer::new();
        sequence.poll_range(0, 100, &mut block);

        let cloned = sequence.clone();
        block.clear();
        assert_eq!(cloned.poll_range(100, 200, &mut block), 1);
    }

    #[test]
    fn test_serde_round_trip() {
        let event = TimedEvent {
            timestamp: 480,
            message: vec![0x90, 64, 80],
        };
        let bytes = bincode::serialize(&event).unwrap();
        let back: TimedEvent = bincode::deserialize(&bytes).unwrap();
        assert_eq!(event, back);
    }
}
