//! Running external programs.

use crate::error::{Error, Result};
use log::debug;
use std::io::{ErrorKind, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;

/// Run `args[0]` with the remaining arguments and return its standard output.
///
/// `stdin` is piped to the program if given. A non-zero exit status yields a
/// [`Error::Subprocess`] carrying both output streams.
pub fn execute<S: AsRef<str>>(args: &[S], stdin: Option<&str>, cwd: Option<&Path>) -> Result<String> {
    let Some((program, arguments)) = args.split_first() else {
        return Err(Error::Other("no command given".into()));
    };
    debug!(
        "executing {}",
        args.iter().map(|a| a.as_ref()).collect::<Vec<_>>().join(" ")
    );
    let mut command = Command::new(program.as_ref());
    command
        .args(arguments.iter().map(|a| a.as_ref()))
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(cwd) = cwd {
        command.current_dir(cwd);
    }
    let mut child = command.spawn().map_err(|e| {
        let message = if e.kind() == ErrorKind::NotFound {
            format!("{}: program not found, is it installed?", program.as_ref())
        } else {
            format!("{}: {}", program.as_ref(), e)
        };
        Error::subprocess(args, message, cwd)
    })?;

    // feed stdin from another thread, the child may fill its output pipes
    // before it has read all input
    let writer = match (stdin, child.stdin.take()) {
        (Some(input), Some(mut pipe)) => {
            let input = input.to_string();
            Some(thread::spawn(move || pipe.write_all(input.as_bytes())))
        }
        _ => None,
    };
    let output = child.wait_with_output()?;
    if let Some(writer) = writer {
        match writer.join() {
            Ok(result) => {
                // a program may exit without reading its input
                if let Err(e) = result {
                    if e.kind() != ErrorKind::BrokenPipe {
                        return Err(e.into());
                    }
                }
            }
            Err(_) => return Err(Error::Other("writing to the child process failed".into())),
        }
    }

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = [stdout.trim(), stderr.trim()]
            .iter()
            .filter(|s| !s.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join("\n");
        return Err(Error::subprocess(args, message, cwd));
    }
    Ok(stdout)
}

/// Check whether `program` can be found in `PATH`.
pub fn is_installed(program: &str) -> bool {
    std::env::var_os("PATH").is_some_and(|paths| {
        std::env::split_paths(&paths).any(|dir| dir.join(program).is_file())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_command() {
        let args: [&str; 0] = [];
        assert!(execute(&args, None, None).is_err());
    }

    #[test]
    fn test_missing_program() {
        let err = execute(&["matuc-no-such-program-here"], None, None).unwrap_err();
        assert!(matches!(err, Error::Subprocess { .. }));
        assert!(!is_installed("matuc-no-such-program-here"));
    }

    #[cfg(unix)]
    #[test]
    fn test_stdin_and_stdout() {
        let out = execute(&["cat"], Some("hallo welt"), None).unwrap();
        assert_eq!(out, "hallo welt");
    }

    #[cfg(unix)]
    #[test]
    fn test_failure_carries_output() {
        let err = execute(&["sh", "-c", "echo kaputt >&2; exit 3"], None, None).unwrap_err();
        assert!(err.message().contains("kaputt"));
    }
}
