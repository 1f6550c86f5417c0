//! Terminal mode handling.

use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::terminal::{self, Clear, ClearType};
use log::{debug, warn};
use std::io::{self, Write};

/// Raw (unbuffered, unechoed) terminal mode for as long as the guard lives.
///
/// The previous mode is restored when the guard is dropped, which also
/// happens while unwinding from a panic.
#[derive(Debug)]
pub struct RawMode {
    _private: (),
}

impl RawMode {
    pub fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        debug!("terminal: raw mode enabled");
        Ok(Self { _private: () })
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        match terminal::disable_raw_mode() {
            Ok(()) => debug!("terminal: raw mode disabled"),
            Err(e) => warn!("terminal: failed to restore mode: {}", e),
        }
    }
}

/// Run `f` with the terminal in its normal mode, re-entering raw mode after.
///
/// Used while a child process owns the terminal. Does nothing special when
/// raw mode is not active.
pub fn with_cooked_mode<T>(f: impl FnOnce() -> T) -> io::Result<T> {
    if !terminal::is_raw_mode_enabled()? {
        return Ok(f());
    }
    terminal::disable_raw_mode()?;
    let result = f();
    terminal::enable_raw_mode()?;
    Ok(result)
}

/// Standard input without the process-wide read buffer.
///
/// Keys are read one byte at a time, so anything typed ahead of the current
/// line stays in the terminal for the next reader, including a child
/// process started by the exec fallback.
#[cfg(unix)]
pub fn unbuffered_stdin() -> io::Result<std::fs::File> {
    unbuffered(io::stdin())
}

#[cfg(not(unix))]
pub fn unbuffered_stdin() -> io::Result<io::Stdin> {
    Ok(io::stdin())
}

/// A `File` sharing `source`'s descriptor and read offset.
#[cfg(unix)]
fn unbuffered(source: impl std::os::fd::AsFd) -> io::Result<std::fs::File> {
    let fd = source.as_fd().try_clone_to_owned()?;
    Ok(std::fs::File::from(fd))
}

/// Clear the whole screen and move the cursor to the top-left corner.
pub fn clear_screen(out: &mut impl Write) -> io::Result<()> {
    queue!(out, Clear(ClearType::All), MoveTo(0, 0))?;
    out.flush()
}

/// Write `text` followed by a line break, using CRLF since raw mode does
/// not translate bare newlines.
pub fn write_lines(out: &mut impl Write, text: &str) -> io::Result<()> {
    for line in text.split('\n') {
        write!(out, "{}\r\n", line.strip_suffix('\r').unwrap_or(line))?;
    }
    out.flush()
}
