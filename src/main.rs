use anyhow::{Context, Result};
use argh::FromArgs;
use barshell::terminal::{self, RawMode};
use barshell::{Session, SessionConfig, history, prompt};
use log::LevelFilter;

#[derive(FromArgs)]
/// Interactive command shell with a colored prompt, history and tab completion.
struct Args {
    #[argh(option, default = "String::from(\"barshell\")")]
    /// text of the prompt segment.
    name: String,

    #[argh(option, default = "String::from(prompt::DEFAULT_END)")]
    /// glyph drawn after the last prompt segment.
    prompt_end: String,

    #[argh(option, default = "String::from(prompt::DEFAULT_MID)")]
    /// separator drawn between prompt segments.
    prompt_mid: String,

    #[argh(option, default = "history::DEFAULT_CAPACITY")]
    /// number of commands kept in history.
    history_size: usize,

    #[argh(switch)]
    /// do not run unknown commands as external programs.
    no_exec: bool,

    #[argh(switch, short = 'v')]
    /// enable debug logging on stderr.
    verbose: bool,
}

fn main() -> Result<()> {
    let args: Args = argh::from_env();

    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let config = SessionConfig {
        name: args.name,
        prompt_mid: args.prompt_mid,
        prompt_end: args.prompt_end,
        history_size: args.history_size,
        exec_fallback: !args.no_exec,
    };
    let mut session = Session::new(&config);

    let _raw = RawMode::enable().context("failed to switch the terminal to raw mode")?;
    let mut input = terminal::unbuffered_stdin().context("failed to open standard input")?;
    let stdout = std::io::stdout();
    session.run(&mut input, &mut stdout.lock())?;
    Ok(())
}
