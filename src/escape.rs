//! Decoding of the terminal control sequences the line editor understands.
//!
//! Sequences are matched against a fixed table one byte at a time. A partial
//! sequence is never interpreted as literal input: the decoder keeps reporting
//! [`Decoded::Pending`] until a full table entry has been seen.

use log::trace;

pub const ESC: u8 = 0x1b;

/// Keys reachable through an escape sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapeKey {
    Home,
    Insert,
    Delete,
    End,
    Up,
    Down,
    Left,
    Right,
}

const SEQUENCES: &[(&[u8], EscapeKey)] = &[
    (b"\x1b[1~", EscapeKey::Home),
    (b"\x1b[2~", EscapeKey::Insert),
    (b"\x1b[3~", EscapeKey::Delete),
    (b"\x1b[4~", EscapeKey::End),
    (b"\x1b[A", EscapeKey::Up),
    (b"\x1b[B", EscapeKey::Down),
    (b"\x1b[C", EscapeKey::Right),
    (b"\x1b[D", EscapeKey::Left),
    // xterm sends these for Home/End instead of the vt220 forms
    (b"\x1b[H", EscapeKey::Home),
    (b"\x1b[F", EscapeKey::End),
];

const MAX_LEN: usize = 4;

/// Returns the key encoded by `buf` when it is exactly one known sequence.
pub fn decode(buf: &[u8]) -> Option<EscapeKey> {
    SEQUENCES
        .iter()
        .find(|(seq, _)| *seq == buf)
        .map(|(_, key)| *key)
}

fn is_prefix(buf: &[u8]) -> bool {
    SEQUENCES.iter().any(|(seq, _)| seq.starts_with(buf))
}

/// Result of feeding one byte to an [`EscapeDecoder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded {
    /// More bytes are needed, or the sequence is unrecognised and is being skipped.
    Pending,
    Key(EscapeKey),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Matching,
    /// Bytes seen so far match no known sequence; swallow until restarted.
    Diverged,
}

/// Accumulator for one in-progress escape sequence.
#[derive(Debug, Clone)]
pub struct EscapeDecoder {
    buf: [u8; MAX_LEN],
    len: usize,
    state: State,
}

impl Default for EscapeDecoder {
    fn default() -> Self {
        Self {
            buf: [0; MAX_LEN],
            len: 0,
            state: State::Idle,
        }
    }
}

impl EscapeDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while a sequence has been started and not yet resolved.
    pub fn is_active(&self) -> bool {
        self.state != State::Idle
    }

    /// Begin a new sequence with the ESC byte, discarding any partial one.
    pub fn start(&mut self) {
        if self.is_active() {
            trace!("escape: restarting over {:?}", self.pending());
        }
        self.buf[0] = ESC;
        self.len = 1;
        self.state = State::Matching;
    }

    /// Feed the next byte of the sequence.
    pub fn push(&mut self, byte: u8) -> Decoded {
        match self.state {
            State::Idle => {
                if byte == ESC {
                    self.start();
                }
                Decoded::Pending
            }
            State::Diverged => Decoded::Pending,
            State::Matching => {
                // `len < MAX_LEN` holds in this state: a full-length buffer is
                // either a table entry or has already diverged.
                self.buf[self.len] = byte;
                self.len += 1;
                let seen = &self.buf[..self.len];
                if let Some(key) = decode(seen) {
                    self.reset();
                    Decoded::Key(key)
                } else if is_prefix(seen) && self.len < MAX_LEN {
                    Decoded::Pending
                } else {
                    trace!("escape: unrecognised sequence {:?}", seen);
                    self.state = State::Diverged;
                    Decoded::Pending
                }
            }
        }
    }

    /// Drop whatever has been accumulated. Returns true if a sequence was in progress.
    pub fn reset(&mut self) -> bool {
        let was_active = self.is_active();
        self.len = 0;
        self.state = State::Idle;
        was_active
    }

    /// Bytes accumulated for the current sequence.
    pub fn pending(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}
