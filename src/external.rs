use crate::error::DispatchError;
use crate::terminal;
use anyhow::{Context, Result, anyhow};
use log::debug;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

/// Fallback that runs unrecognised input as an external program.
///
/// The program inherits the shell's stdio and runs with the terminal in its
/// normal mode. Its output goes straight to the terminal, so the returned
/// string is empty on success; any other outcome is reported as an error.
pub fn exec_fallback(input: &str) -> Result<String> {
    let mut words = input.split_whitespace();
    let Some(name) = words.next() else {
        return Ok(String::new());
    };
    let args: Vec<&str> = words.collect();

    let search_paths = std::env::var_os("PATH").unwrap_or_default();
    let program = resolve_program(name, &search_paths)?;
    debug!("exec: {} {:?}", program.display(), args);

    let status = terminal::with_cooked_mode(|| Command::new(&program).args(&args).status())?
        .with_context(|| format!("failed to run '{}'", name))?;
    check_status(name, status)?;
    Ok(String::new())
}

/// Locate the program a command word names.
///
/// A word with more than one path component (`/bin/ls`, `./build.sh`,
/// `tools/run`) is taken as a path; a bare word is looked up in
/// `search_paths`, which uses PATH syntax. The working directory is never
/// searched for bare words. Only runnable regular files count.
pub fn resolve_program(name: &str, search_paths: &OsStr) -> Result<PathBuf, DispatchError> {
    let path = Path::new(name);
    let found = if path.is_absolute() || path.components().count() > 1 {
        is_runnable(path).then(|| path.to_path_buf())
    } else if name.is_empty() {
        None
    } else {
        std::env::split_paths(search_paths)
            .map(|dir| dir.join(name))
            .find(|candidate| is_runnable(candidate))
    };
    found.ok_or_else(|| DispatchError::not_found(name))
}

#[cfg(unix)]
fn is_runnable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_runnable(path: &Path) -> bool {
    path.is_file()
}

/// Map a finished child to the error the session shows, if any.
fn check_status(name: &str, status: ExitStatus) -> Result<()> {
    if status.success() {
        return Ok(());
    }
    match status.code() {
        Some(code) => Err(anyhow!("'{}' exited with status {}", name, code)),
        None => Err(anyhow!("'{}' {}", name, abnormal_exit(status))),
    }
}

#[cfg(unix)]
fn abnormal_exit(status: ExitStatus) -> String {
    use std::os::unix::process::ExitStatusExt;
    match status.signal() {
        Some(signal) if status.core_dumped() => {
            format!("killed by signal {} (core dumped)", signal)
        }
        Some(signal) => format!("killed by signal {}", signal),
        None => "terminated abnormally".to_string(),
    }
}

#[cfg(not(unix))]
fn abnormal_exit(_status: ExitStatus) -> String {
    "terminated abnormally".to_string()
}
