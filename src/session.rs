use crate::builtin::register_builtins;
use crate::external::exec_fallback;
use crate::history::{DEFAULT_CAPACITY, History};
use crate::line::{KeyOutcome, Line};
use crate::prompt::{self, Prompt, PromptSegment};
use crate::registry::Registry;
use crate::terminal;
use log::debug;
use std::io::{self, ErrorKind, Read, Write};

/// Words that end the session instead of being dispatched.
pub const EXIT_WORDS: [&str; 2] = ["exit", "quit"];

/// Settings for a [`Session`].
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Text of the initial prompt segment.
    pub name: String,
    pub prompt_mid: String,
    pub prompt_end: String,
    pub history_size: usize,
    /// Run unrecognised input as external programs.
    pub exec_fallback: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            name: "barshell".to_string(),
            prompt_mid: prompt::DEFAULT_MID.to_string(),
            prompt_end: prompt::DEFAULT_END.to_string(),
            history_size: DEFAULT_CAPACITY,
            exec_fallback: true,
        }
    }
}

/// An interactive shell: reads edited lines and dispatches them to commands.
///
/// The session owns its command registry, history and prompt, so several
/// sessions can coexist in one process.
///
/// Example
/// ```
/// use barshell::{Session, SessionConfig};
/// let mut session = Session::new(&SessionConfig::default());
/// let mut out = Vec::new();
/// let line = session.read_line(&mut &b"help\r"[..], &mut out).unwrap();
/// assert_eq!(line.as_deref(), Some("help"));
/// ```
pub struct Session {
    registry: Registry,
    history: History,
    prompt: Prompt,
}

impl Session {
    /// A session with the builtin commands and, if enabled, the exec fallback.
    pub fn new(config: &SessionConfig) -> Self {
        let mut registry = Registry::new();
        register_builtins(&mut registry);
        if config.exec_fallback {
            registry.register_fallback(exec_fallback);
        }

        let mut prompt = Prompt::new(config.prompt_mid.clone(), config.prompt_end.clone());
        prompt.push_segment(PromptSegment::new(config.name.clone(), "black", "white"));

        Self::with_parts(registry, History::with_capacity(config.history_size), prompt)
    }

    pub fn with_parts(registry: Registry, history: History, prompt: Prompt) -> Self {
        Self {
            registry,
            history,
            prompt,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn prompt(&self) -> &Prompt {
        &self.prompt
    }

    pub fn prompt_mut(&mut self) -> &mut Prompt {
        &mut self.prompt
    }

    /// Read and edit one line, a byte at a time, redrawing after every key.
    ///
    /// Returns the trimmed line once Enter is pressed, or `None` when `input`
    /// is exhausted.
    pub fn read_line(
        &mut self,
        input: &mut impl Read,
        out: &mut impl Write,
    ) -> io::Result<Option<String>> {
        let mut line = Line::new();
        self.prompt.redraw(out, &line)?;

        let mut byte = [0u8; 1];
        loop {
            match input.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => {}
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }

            match line.handle_byte(byte[0], &mut self.history, &self.registry) {
                KeyOutcome::Continue => {}
                KeyOutcome::Finished => {
                    self.prompt.redraw(out, &line)?;
                    terminal::write_lines(out, "")?;
                    return Ok(Some(line.content().trim().to_string()));
                }
                KeyOutcome::Interrupted => {
                    terminal::write_lines(out, "^C")?;
                    line = Line::new();
                }
                KeyOutcome::ClearScreen => terminal::clear_screen(out)?,
                KeyOutcome::Candidates(candidates) => {
                    terminal::write_lines(out, "")?;
                    terminal::write_lines(out, &candidates.join("  "))?;
                }
            }
            self.prompt.redraw(out, &line)?;
        }
    }

    /// Run one finished line. Returns false when the line asks to leave.
    pub fn execute(&mut self, line: &str, out: &mut impl Write) -> io::Result<bool> {
        if EXIT_WORDS.contains(&line) {
            debug!("session: {:?} requested exit", line);
            return Ok(false);
        }

        match self.registry.dispatch(line) {
            Ok(output) if !output.output.is_empty() => self.output(out, &output.output)?,
            Ok(_) => {}
            Err(err) => self.error(out, &err.to_string())?,
        }
        Ok(true)
    }

    /// Read and execute lines until `exit`, `quit` or end of input.
    pub fn run(&mut self, input: &mut impl Read, out: &mut impl Write) -> io::Result<()> {
        while let Some(line) = self.read_line(input, out)? {
            if !self.execute(&line, out)? {
                break;
            }
        }
        terminal::write_lines(out, "")
    }

    /// Print `message` after the prompt.
    pub fn output(&self, out: &mut impl Write, message: &str) -> io::Result<()> {
        write!(out, "{}", self.prompt.render())?;
        terminal::write_lines(out, message)
    }

    /// Print `message` after the prompt drawn in alert colors.
    pub fn error(&self, out: &mut impl Write, message: &str) -> io::Result<()> {
        write!(out, "{}", self.prompt.render_alert())?;
        terminal::write_lines(out, message)
    }
}
