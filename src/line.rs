//! The line being edited and the keystroke state machine that drives it.
//!
//! Input is processed one raw byte at a time. The line stores bytes, not
//! characters: every printable key is a single ASCII byte.

use crate::escape::{Decoded, ESC, EscapeDecoder, EscapeKey};
use crate::history::History;
use crate::registry::{CANDIDATE_SEPARATOR, Completer};
use log::trace;
use std::borrow::Cow;

pub const CTRL_C: u8 = 0x03;
pub const CTRL_D: u8 = 0x04;
pub const CTRL_H: u8 = 0x08;
pub const TAB: u8 = 0x09;
pub const CTRL_L: u8 = 0x0c;
pub const BACKSPACE: u8 = 0x7f;

/// Bytes inserted into the line as typed.
pub fn is_printable(byte: u8) -> bool {
    byte == b' ' || byte.is_ascii_graphic()
}

/// Insert `ch` before position `index` of `input`.
pub fn insert_char(input: &str, index: usize, ch: u8) -> String {
    let mut bytes = input.as_bytes().to_vec();
    bytes.insert(index.min(bytes.len()), ch);
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Remove the byte at `index` of `input`; out of range is a no-op.
pub fn delete_char(input: &str, index: usize) -> String {
    let mut bytes = input.as_bytes().to_vec();
    if index < bytes.len() {
        bytes.remove(index);
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

/// What the caller should do after a keystroke has been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Keep reading; redraw the line.
    Continue,
    /// Enter was pressed, the line is complete.
    Finished,
    /// Ctrl-C: the line was abandoned and cleared.
    Interrupted,
    /// Ctrl-L: clear the terminal, then redraw.
    ClearScreen,
    /// Tab produced several candidates to show; the line is unchanged.
    Candidates(Vec<String>),
}

/// Editing state of a single input line.
#[derive(Debug, Clone, Default)]
pub struct Line {
    content: Vec<u8>,
    cursor: usize,
    escape: EscapeDecoder,
    tab_cycle: usize,
}

impl Line {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.content)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.content
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn tab_cycle(&self) -> usize {
        self.tab_cycle
    }

    /// True while an escape sequence is being collected.
    pub fn in_escape(&self) -> bool {
        self.escape.is_active()
    }

    /// Replace the whole content and put the cursor at the end.
    pub fn set_content(&mut self, content: &str) {
        self.content = content.as_bytes().to_vec();
        self.cursor = self.content.len();
    }

    pub fn clear(&mut self) {
        self.content.clear();
        self.cursor = 0;
    }

    /// Insert `byte` before position `index`.
    ///
    /// The cursor keeps pointing at the same byte, so inserting at or before
    /// it moves it right by one.
    pub fn insert_at(&mut self, index: usize, byte: u8) {
        let index = index.min(self.content.len());
        self.content.insert(index, byte);
        if index <= self.cursor {
            self.cursor += 1;
        }
    }

    /// Remove the byte at `index`. Returns false when `index` is past the end.
    ///
    /// Deleting before the cursor moves it left by one.
    pub fn delete_at(&mut self, index: usize) -> bool {
        if index >= self.content.len() {
            return false;
        }
        self.content.remove(index);
        if index < self.cursor {
            self.cursor -= 1;
        }
        true
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.content.len() {
            self.cursor += 1;
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.content.len();
    }

    /// Apply one raw input byte.
    ///
    /// A finished non-empty line is pushed to `history`. Tab asks `completer`
    /// for a completion of the current content.
    pub fn handle_byte(
        &mut self,
        byte: u8,
        history: &mut History,
        completer: &dyn Completer,
    ) -> KeyOutcome {
        if byte != TAB {
            self.tab_cycle = 0;
        }

        match byte {
            b'\n' | b'\r' => {
                if self.escape.reset() {
                    trace!("line: dropping unfinished escape sequence");
                }
                if !self.content.is_empty() {
                    history.push(self.content().into_owned());
                }
                KeyOutcome::Finished
            }
            ESC => {
                self.escape.start();
                KeyOutcome::Continue
            }
            _ if self.escape.is_active() => {
                if let Decoded::Key(key) = self.escape.push(byte) {
                    self.handle_escape(key, history);
                }
                KeyOutcome::Continue
            }
            _ if is_printable(byte) => {
                self.insert_at(self.cursor, byte);
                KeyOutcome::Continue
            }
            _ => self.handle_special(byte, completer),
        }
    }

    fn handle_escape(&mut self, key: EscapeKey, history: &mut History) {
        trace!("line: escape key {:?}", key);
        match key {
            EscapeKey::Left => self.move_left(),
            EscapeKey::Right => self.move_right(),
            EscapeKey::Home => self.move_home(),
            EscapeKey::End => self.move_end(),
            EscapeKey::Delete => {
                self.delete_at(self.cursor);
            }
            EscapeKey::Insert => {}
            EscapeKey::Up => {
                let previous = history.previous();
                if !previous.is_empty() {
                    self.set_content(&previous);
                }
                self.move_end();
            }
            EscapeKey::Down => {
                let next = history.next();
                self.set_content(&next);
            }
        }
    }

    fn handle_special(&mut self, byte: u8, completer: &dyn Completer) -> KeyOutcome {
        match byte {
            BACKSPACE | CTRL_H => {
                if self.cursor > 0 {
                    self.delete_at(self.cursor - 1);
                }
                KeyOutcome::Continue
            }
            TAB => {
                let completed = completer.complete(&self.content(), self.tab_cycle);
                self.tab_cycle = (self.tab_cycle + 1) % 2;
                if completed.contains(CANDIDATE_SEPARATOR) {
                    KeyOutcome::Candidates(
                        completed
                            .split(CANDIDATE_SEPARATOR)
                            .map(str::to_string)
                            .collect(),
                    )
                } else {
                    self.set_content(&completed);
                    KeyOutcome::Continue
                }
            }
            CTRL_L => KeyOutcome::ClearScreen,
            CTRL_D => {
                self.clear();
                KeyOutcome::Continue
            }
            CTRL_C => {
                self.clear();
                KeyOutcome::Interrupted
            }
            _ => {
                trace!("line: ignoring control byte {:#04x}", byte);
                KeyOutcome::Continue
            }
        }
    }
}
