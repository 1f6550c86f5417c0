use crate::registry::{Command, Registry};
use anyhow::{Result, anyhow};
use argh::{EarlyExit, FromArgs};
use std::fmt::Write;
use std::marker::PhantomData;

/// Built-in commands shipped with the shell.
///
/// Arguments are parsed with [`argh`] (`FromArgs`), so every builtin gets
/// `--help` and argument validation for free.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "help".
    fn name() -> &'static str;

    /// One-line summary shown by `help`.
    fn description() -> &'static str;

    /// Text shown by `help <name>`.
    fn help() -> &'static str;

    /// Run the parsed command and return its output.
    fn execute(self, registry: &Registry) -> Result<String>;

    fn tab_complete(_partial: &str, _tab_cycle: usize, _registry: &Registry) -> String {
        String::new()
    }
}

/// Adapter exposing a [`BuiltinCommand`] type through the [`Command`] trait.
pub(crate) struct Builtin<T> {
    _phantom: PhantomData<T>,
}

impl<T> Default for Builtin<T> {
    fn default() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<T: BuiltinCommand> Command for Builtin<T> {
    fn description(&self) -> &str {
        T::description()
    }

    fn help(&self) -> &str {
        T::help()
    }

    fn execute(&self, args: &str, registry: &Registry) -> Result<String> {
        let args: Vec<&str> = args.split_whitespace().collect();
        match T::from_args(&[T::name()], &args) {
            Ok(cmd) => cmd.execute(registry),
            Err(EarlyExit { output, status }) => match status {
                Ok(()) => Ok(output),
                Err(()) => Err(anyhow!(output.trim_end().to_string())),
            },
        }
    }

    fn tab_complete(&self, partial: &str, tab_cycle: usize, registry: &Registry) -> String {
        T::tab_complete(partial, tab_cycle, registry)
    }
}

fn register<T: BuiltinCommand + 'static>(registry: &mut Registry) {
    registry.register_command(T::name(), Builtin::<T>::default());
}

/// Register `help` and `chargen`.
pub fn register_builtins(registry: &mut Registry) {
    register::<Help>(registry);
    register::<Chargen>(registry);
}

#[derive(FromArgs)]
/// Display help information.
pub struct Help {
    #[argh(positional)]
    /// command to describe; lists every command when omitted.
    pub command: Option<String>,
}

impl BuiltinCommand for Help {
    fn name() -> &'static str {
        "help"
    }

    fn description() -> &'static str {
        "Display help information"
    }

    fn help() -> &'static str {
        "help [command]\nShow the list of commands, or the help text of one command"
    }

    fn execute(self, registry: &Registry) -> Result<String> {
        if let Some(name) = self.command {
            return registry
                .get(&name)
                .map(|cmd| cmd.help().to_string())
                .ok_or_else(|| anyhow!("command '{}' not found", name));
        }

        let mut out = String::from("Available commands:\n");
        for (name, cmd) in registry.iter() {
            writeln!(out, "\t{} - {}", name, cmd.description())?;
        }
        out.push_str("\texit - exit the application");
        Ok(out)
    }

    fn tab_complete(partial: &str, tab_cycle: usize, registry: &Registry) -> String {
        registry.tab_complete(partial, tab_cycle)
    }
}

const PATTERN: &[u8] = b"ABCDEF0123456789";
const BLOCK_WIDTHS: [usize; 4] = [10, 8, 5, 4];

#[derive(FromArgs)]
/// Generate characters to help with overflows.
pub struct Chargen {
    #[argh(option, short = 'm', default = "60")]
    /// length of the longest generated pattern.
    pub max: usize,
}

impl BuiltinCommand for Chargen {
    fn name() -> &'static str {
        "chargen"
    }

    fn description() -> &'static str {
        "Generate characters to help with overflows"
    }

    fn help() -> &'static str {
        "chargen [--max N]\nGenerates a set of strings that could aid in developing exploits for buffer overflows"
    }

    fn execute(self, _registry: &Registry) -> Result<String> {
        Ok(chargen(self.max))
    }
}

/// Offset ruler for blocks of `width` bytes, e.g. `x10 0        10        20`.
fn ruler(width: usize, max: usize) -> String {
    let mut out = format!("x{:02} ", width);
    let mut offset = 0;
    while offset <= max {
        let next = (offset + width).to_string();
        out.push_str(&offset.to_string());
        out.push_str(&" ".repeat(width.saturating_sub(next.len())));
        offset += width;
    }
    out.push('\n');
    out
}

/// Patterns made of `width`-long runs of distinct characters, one line per
/// length from `width` to `max`, for each block width.
fn chargen(max: usize) -> String {
    let mut out = String::new();
    for width in BLOCK_WIDTHS {
        out.push('\n');
        out.push_str(&ruler(width, max));
        let mut len = width;
        while len <= max {
            let pattern: String = (0..len / width)
                .flat_map(|block| {
                    std::iter::repeat_n(PATTERN[block % PATTERN.len()] as char, width)
                })
                .collect();
            out.push_str(&format!("{:04} {}\n", pattern.len(), pattern));
            len += width;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::no_completion;

    fn registry() -> Registry {
        let mut registry = Registry::new();
        register_builtins(&mut registry);
        registry.register(
            "listen",
            "Listen for incoming connections",
            "listen <port>\nListen for incoming connections on defined port",
            |_| Ok(String::new()),
            no_completion,
        );
        registry
    }

    #[test]
    fn test_help_lists_commands_sorted() {
        let out = registry().dispatch("help").unwrap().output;
        assert_eq!(
            out,
            "Available commands:\n\
             \tchargen - Generate characters to help with overflows\n\
             \thelp - Display help information\n\
             \tlisten - Listen for incoming connections\n\
             \texit - exit the application"
        );
    }

    #[test]
    fn test_help_for_one_command() {
        let out = registry().dispatch("help listen").unwrap().output;
        assert_eq!(out, "listen <port>\nListen for incoming connections on defined port");
    }

    #[test]
    fn test_help_unknown_command_fails() {
        let err = registry().dispatch("help nope").unwrap_err();
        assert_eq!(err.to_string(), "command 'nope' not found");
    }

    #[test]
    fn test_help_rejects_extra_arguments() {
        assert!(registry().dispatch("help listen now").is_err());
    }

    #[test]
    fn test_help_flag_prints_usage() {
        let out = registry().dispatch("chargen --help").unwrap().output;
        assert!(out.contains("Usage: chargen"), "{}", out);
        assert!(out.contains("--max"));
    }

    #[test]
    fn test_help_completes_command_names() {
        let registry = registry();
        assert_eq!(registry.tab_complete("help li", 0), "help listen");
        assert_eq!(registry.tab_complete("help ", 0), "chargen\thelp\tlisten");
    }

    #[test]
    fn test_ruler() {
        let expected = format!(
            "x10 0{pad}10{pad}20{pad}30{pad}40{pad}50{pad}60{pad}\n",
            pad = " ".repeat(8)
        );
        assert_eq!(ruler(10, 60), expected);
        assert!(ruler(4, 60).starts_with("x04 0   4   8  12  16  "));
    }

    #[test]
    fn test_chargen_patterns() {
        let out = chargen(60);
        assert!(out.contains("0010 AAAAAAAAAA\n"));
        assert!(out.contains("0020 AAAAAAAAAABBBBBBBBBB\n"));
        assert!(out.contains(
            "0060 AAAABBBBCCCCDDDDEEEEFFFF000011112222333344445555666677778888\n"
        ));

        let lines = out.lines().filter(|l| l.starts_with("00")).count();
        assert_eq!(lines, 6 + 7 + 12 + 15);
    }

    #[test]
    fn test_chargen_max_option() {
        let out = registry().dispatch("chargen -m 20").unwrap().output;
        assert!(out.contains("0020 AAAAAAAAAABBBBBBBBBB\n"));
        assert!(!out.contains("0030 "));
    }
}
