//! Helpers over raw MIDI message bytes.
//!
//! The buffer types store messages as opaque byte slices; these helpers
//! classify them without parsing. Full structured decoding goes through
//! [`parse`], which defers to `midi-msg`.

use midi_msg::MidiMsg;

/// Extract the status nibble (`0x80`, `0x90`, ... `0xF0`) of a message.
#[inline]
pub fn status(bytes: &[u8]) -> Option<u8> {
    bytes.first().map(|b| b & 0xF0)
}

/// Extract the channel (0-15) of a channel-voice message.
#[inline]
pub fn channel(bytes: &[u8]) -> Option<u8> {
    match bytes.first() {
        Some(b) if *b < 0xF0 => Some(b & 0x0F),
        _ => None,
    }
}

/// True for a Note On with non-zero velocity.
#[inline]
pub fn is_note_on(bytes: &[u8]) -> bool {
    matches!(bytes, [s, _, v, ..] if s & 0xF0 == 0x90 && *v > 0)
}

/// True for a Note Off, including the Note On/velocity-0 form.
#[inline]
pub fn is_note_off(bytes: &[u8]) -> bool {
    match bytes {
        [s, _, v, ..] => s & 0xF0 == 0x80 || (s & 0xF0 == 0x90 && *v == 0),
        _ => false,
    }
}

/// Note number of a note message, if this is one.
#[inline]
pub fn note(bytes: &[u8]) -> Option<u8> {
    match bytes {
        [s, n, ..] if matches!(s & 0xF0, 0x80 | 0x90 | 0xA0) => Some(*n),
        _ => None,
    }
}

/// True for a System Exclusive message.
#[inline]
pub fn is_sysex(bytes: &[u8]) -> bool {
    bytes.first() == Some(&0xF0)
}

/// Decode into a structured `midi-msg` message, or `None` for bytes that
/// are not a well-formed MIDI message.
pub fn parse(bytes: &[u8]) -> Option<MidiMsg> {
    MidiMsg::from_midi(bytes).ok().map(|(msg, _len)| msg)
}
