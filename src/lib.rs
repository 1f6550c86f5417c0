//! A small interactive command shell with its own line editor.
//!
//! Raw keystrokes are read one byte at a time and fed to an editable
//! [`Line`]: printable keys are inserted at the cursor, arrow/Home/End/Delete
//! escape sequences move or edit, Up/Down recall entries from a bounded
//! [`History`], and Tab asks the [`Registry`] for completions. Finished lines
//! are dispatched to named commands, or to a fallback that runs external
//! programs.
//!
//! The main entry point is [`Session`], which owns a registry, a history and
//! a colored, segmented [`Prompt`]. Custom commands are added either as
//! closures through [`Registry::register`] or by implementing [`Command`].

mod builtin;
mod error;
pub mod escape;
mod external;
pub mod history;
pub mod line;
pub mod prompt;
mod registry;
mod session;
pub mod terminal;

pub use builtin::register_builtins;
pub use error::DispatchError;
pub use external::{exec_fallback, resolve_program};
pub use history::History;
pub use line::{KeyOutcome, Line};
pub use prompt::{Prompt, PromptSegment, colorize};
pub use registry::{
    CANDIDATE_SEPARATOR, Callback, Command, CommandOutput, Completer, Registry, TabComplete,
    no_completion,
};
pub use session::{EXIT_WORDS, Session, SessionConfig};
