//! Named commands and the dispatcher that routes input lines to them.

use crate::error::DispatchError;
use anyhow::Result;
use log::debug;
use std::collections::BTreeMap;
use std::time::{Duration, Instant, SystemTime};

/// Separator between candidates in a multi-candidate completion.
pub const CANDIDATE_SEPARATOR: &str = "\t";

/// Callback invoked with the text following the command name.
pub type Callback = Box<dyn Fn(&str) -> Result<String>>;

/// Completion function: receives the partial argument text and the tab cycle.
pub type TabComplete = Box<dyn Fn(&str, usize) -> String>;

/// Anything the shell can run by name.
///
/// Commands registered through [`Registry::register`] are plain closures;
/// implement this trait directly when a command needs to look at the
/// registry it lives in (e.g. `help`).
pub trait Command {
    /// One-line summary.
    fn description(&self) -> &str;

    /// Detailed help text.
    fn help(&self) -> &str;

    /// Run the command with everything after its name.
    fn execute(&self, args: &str, registry: &Registry) -> Result<String>;

    /// Complete the argument text.
    ///
    /// Returns a single completion, a tab-separated list of candidates, or
    /// an empty string when there is nothing to suggest.
    fn tab_complete(&self, _partial: &str, _tab_cycle: usize, _registry: &Registry) -> String {
        String::new()
    }
}

/// Source of tab completions for the line editor.
pub trait Completer {
    fn complete(&self, partial: &str, tab_cycle: usize) -> String;
}

impl<F: Fn(&str, usize) -> String> Completer for F {
    fn complete(&self, partial: &str, tab_cycle: usize) -> String {
        self(partial, tab_cycle)
    }
}

/// Completion function for commands that take no completable arguments.
pub fn no_completion(_partial: &str, _tab_cycle: usize) -> String {
    String::new()
}

struct FnCommand {
    description: String,
    help: String,
    callback: Callback,
    tab_complete: TabComplete,
}

impl Command for FnCommand {
    fn description(&self) -> &str {
        &self.description
    }

    fn help(&self) -> &str {
        &self.help
    }

    fn execute(&self, args: &str, _registry: &Registry) -> Result<String> {
        (self.callback)(args)
    }

    fn tab_complete(&self, partial: &str, tab_cycle: usize, _registry: &Registry) -> String {
        (self.tab_complete)(partial, tab_cycle)
    }
}

/// Result of a successful dispatch.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// The input line that was dispatched.
    pub command: String,
    pub output: String,
    pub started_at: SystemTime,
    pub finished_at: SystemTime,
    pub elapsed: Duration,
}

impl CommandOutput {
    fn empty(command: &str) -> Self {
        let now = SystemTime::now();
        Self {
            command: command.to_string(),
            output: String::new(),
            started_at: now,
            finished_at: now,
            elapsed: Duration::ZERO,
        }
    }
}

/// Mapping from command name to command, plus an optional fallback for
/// input that matches no name.
#[derive(Default)]
pub struct Registry {
    commands: BTreeMap<String, Box<dyn Command>>,
    fallback: Option<Callback>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a closure-backed command, replacing any command with the same name.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        help: impl Into<String>,
        callback: impl Fn(&str) -> Result<String> + 'static,
        tab_complete: impl Fn(&str, usize) -> String + 'static,
    ) {
        self.register_command(
            name,
            FnCommand {
                description: description.into(),
                help: help.into(),
                callback: Box::new(callback),
                tab_complete: Box::new(tab_complete),
            },
        );
    }

    /// Register a command object, replacing any command with the same name.
    pub fn register_command(&mut self, name: impl Into<String>, command: impl Command + 'static) {
        let name = name.into();
        debug!("registering command {:?}: {}", name, command.description());
        if self.commands.insert(name.clone(), Box::new(command)).is_some() {
            debug!("command {:?} replaced", name);
        }
    }

    /// Set the callback for input whose first word is not a registered name.
    ///
    /// The fallback receives the whole input line.
    pub fn register_fallback(&mut self, callback: impl Fn(&str) -> Result<String> + 'static) {
        self.fallback = Some(Box::new(callback));
    }

    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    pub fn get(&self, name: &str) -> Option<&dyn Command> {
        self.commands.get(name).map(|c| &**c)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Registered names in lexicographic order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.commands.keys().map(String::as_str)
    }

    /// Registered commands in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &dyn Command)> + '_ {
        self.commands.iter().map(|(n, c)| (n.as_str(), &**c))
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Run the command named by the first word of `input`.
    pub fn dispatch(&self, input: &str) -> Result<CommandOutput, DispatchError> {
        if self.commands.is_empty() {
            return Err(DispatchError::NoCommandsRegistered);
        }

        let mut words = input.split_whitespace();
        let Some(name) = words.next() else {
            return Ok(CommandOutput::empty(input));
        };

        let started_at = SystemTime::now();
        let timer = Instant::now();
        let output = if let Some(command) = self.commands.get(name) {
            let args = words.collect::<Vec<_>>().join(" ");
            debug!("dispatch: {} {:?}", name, args);
            command.execute(&args, self)?
        } else if let Some(fallback) = &self.fallback {
            debug!("dispatch: fallback for {:?}", input);
            fallback(input)?
        } else {
            return Err(DispatchError::not_found(name));
        };
        let elapsed = timer.elapsed();
        debug!("dispatch: {} finished in {:?}", name, elapsed);

        Ok(CommandOutput {
            command: input.to_string(),
            output,
            started_at,
            finished_at: started_at + elapsed,
            elapsed,
        })
    }

    /// Complete a partially typed line.
    ///
    /// * empty input lists every command;
    /// * a full command name hands the rest of the line to that command;
    /// * otherwise the first word is completed against command names: a
    ///   unique match on the first press, every match on the second.
    ///
    /// Multiple candidates come back joined with [`CANDIDATE_SEPARATOR`].
    pub fn tab_complete(&self, partial: &str, tab_cycle: usize) -> String {
        let words: Vec<&str> = partial.split_whitespace().collect();
        let Some(first) = words.first().copied() else {
            return join_candidates(self.names());
        };

        if let Some(command) = self.commands.get(first) {
            let rest = words[1..].join(" ");
            let completed = command.tab_complete(&rest, tab_cycle, self);
            return if completed.contains(CANDIDATE_SEPARATOR) {
                completed
            } else {
                format!("{} {}", first, completed)
            };
        }

        let matches: Vec<&str> = self
            .names()
            .filter(|name| name.len() > first.len() && name.starts_with(first))
            .collect();
        match (matches.len(), tab_cycle) {
            (0, _) => partial.to_string(),
            (1, 0) => matches[0].to_string(),
            (_, 0) => partial.to_string(),
            _ => join_candidates(matches),
        }
    }
}

fn join_candidates<'a>(names: impl IntoIterator<Item = &'a str>) -> String {
    names
        .into_iter()
        .collect::<Vec<_>>()
        .join(CANDIDATE_SEPARATOR)
}

impl Completer for Registry {
    fn complete(&self, partial: &str, tab_cycle: usize) -> String {
        self.tab_complete(partial, tab_cycle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn echo(args: &str) -> Result<String> {
        Ok(args.to_string())
    }

    fn registry_with(names: &[&str]) -> Registry {
        let mut registry = Registry::new();
        for name in names {
            registry.register(*name, "test command", "no help", echo, no_completion);
        }
        registry
    }

    #[test]
    fn test_dispatch_without_commands_fails() {
        let registry = Registry::new();
        assert!(matches!(
            registry.dispatch("help"),
            Err(DispatchError::NoCommandsRegistered)
        ));
    }

    #[test]
    fn test_dispatch_empty_input_is_noop() {
        let registry = registry_with(&["help"]);
        let out = registry.dispatch("").unwrap();
        assert_eq!(out.output, "");
        assert_eq!(out.elapsed, Duration::ZERO);
    }

    #[test]
    fn test_dispatch_passes_remainder() {
        let seen = Rc::new(RefCell::new(None));
        let mut registry = Registry::new();
        let sink = seen.clone();
        registry.register(
            "help",
            "Display help information",
            "Show this message",
            move |args| {
                *sink.borrow_mut() = Some(args.to_string());
                Ok("ok".to_string())
            },
            no_completion,
        );

        let out = registry.dispatch("help extra args").unwrap();
        assert_eq!(seen.borrow().as_deref(), Some("extra args"));
        assert_eq!(out.output, "ok");
        assert_eq!(out.command, "help extra args");
        assert!(out.finished_at >= out.started_at);
    }

    #[test]
    fn test_dispatch_collapses_whitespace_in_remainder() {
        let registry = registry_with(&["echo"]);
        assert_eq!(registry.dispatch("echo  a   b").unwrap().output, "a b");
    }

    #[test]
    fn test_dispatch_unknown_without_fallback() {
        let registry = registry_with(&["help"]);
        match registry.dispatch("frob --now") {
            Err(DispatchError::CommandNotFound { name }) => assert_eq!(name, "frob"),
            other => panic!("unexpected {:?}", other.map(|o| o.output)),
        }
    }

    #[test]
    fn test_dispatch_fallback_gets_whole_input() {
        let mut registry = registry_with(&["help"]);
        registry.register_fallback(|input| Ok(format!("fallback:{}", input)));
        assert!(registry.has_fallback());
        assert_eq!(
            registry.dispatch("ls -la /tmp").unwrap().output,
            "fallback:ls -la /tmp"
        );
    }

    #[test]
    fn test_callback_error_propagates_unmodified() {
        let mut registry = Registry::new();
        registry.register(
            "fail",
            "always fails",
            "",
            |_| Err(anyhow::anyhow!("boom")),
            no_completion,
        );
        let err = registry.dispatch("fail").unwrap_err();
        assert!(matches!(err, DispatchError::Callback(_)));
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_register_overwrites() {
        let mut registry = registry_with(&["x"]);
        registry.register("x", "second", "", |_| Ok("two".into()), no_completion);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("x").unwrap().description(), "second");
        assert_eq!(registry.dispatch("x").unwrap().output, "two");
    }

    #[test]
    fn test_tab_complete_empty_lists_sorted_names() {
        let registry = registry_with(&["listen", "help", "agents", "chargen"]);
        assert_eq!(
            registry.tab_complete("", 0),
            "agents\tchargen\thelp\tlisten"
        );
        assert_eq!(registry.tab_complete("   ", 1), "agents\tchargen\thelp\tlisten");
    }

    #[test]
    fn test_tab_complete_unique_prefix() {
        let registry = registry_with(&["listen", "help", "nolisten"]);
        assert_eq!(registry.tab_complete("he", 0), "help");
        assert_eq!(registry.tab_complete("he", 1), "help");
    }

    #[test]
    fn test_tab_complete_ambiguous_prefix() {
        let registry = registry_with(&["chargen", "chat", "help"]);
        assert_eq!(registry.tab_complete("ch", 0), "ch");
        assert_eq!(registry.tab_complete("ch", 1), "chargen\tchat");
    }

    #[test]
    fn test_tab_complete_no_match_returns_partial() {
        let registry = registry_with(&["help"]);
        assert_eq!(registry.tab_complete("zz", 0), "zz");
        assert_eq!(registry.tab_complete("zz", 1), "zz");
    }

    #[test]
    fn test_tab_complete_delegates_to_command() {
        let mut registry = registry_with(&["help"]);
        registry.register(
            "listen",
            "Listen for incoming connections",
            "listen <port>",
            echo,
            |partial: &str, tab_cycle: usize| match (partial, tab_cycle) {
                ("8", 0) => "8443".to_string(),
                _ => "8443\t8080".to_string(),
            },
        );
        assert_eq!(registry.tab_complete("listen 8", 0), "listen 8443");
        assert_eq!(registry.tab_complete("listen 8", 1), "8443\t8080");
        assert_eq!(registry.tab_complete("help", 0), "help ");
    }

    #[test]
    fn test_closure_completer() {
        let completer = |partial: &str, _cycle: usize| partial.to_uppercase();
        assert_eq!(completer.complete("abc", 0), "ABC");
    }
}
