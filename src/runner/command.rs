//! Command execution
//!
//! This module spawns one child process per call, waits for it and captures
//! both output streams. The working directory is passed to the child; the
//! parent's current directory is never changed.

use crate::error::{ExecResult, ExecutionError};
use std::path::Path;
use std::process::{Command as StdCommand, ExitStatus, Stdio};

/// Exit code reported when a child ends without one and no signal is known
const UNKNOWN_EXIT_CODE: i32 = 1;

/// What a finished child process produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Run a command line through the interpreter (e.g., `sh -c <line>`)
pub fn run_shell(line: &str, interpreter: &[String], dir: &Path) -> ExecResult<CommandOutput> {
    let (program, interpreter_args) = interpreter
        .split_first()
        .ok_or(ExecutionError::EmptyCommand)?;

    let mut command = StdCommand::new(program);
    command.args(interpreter_args).arg(line);

    capture(command, line, dir)
}

/// Run a program directly with an argument vector, bypassing the shell
pub fn run_argv(argv: &[String], dir: &Path) -> ExecResult<CommandOutput> {
    let (program, args) = argv.split_first().ok_or(ExecutionError::EmptyCommand)?;

    let mut command = StdCommand::new(program);
    command.args(args);

    capture(command, &argv.join(" "), dir)
}

fn capture(mut command: StdCommand, display: &str, dir: &Path) -> ExecResult<CommandOutput> {
    command
        .current_dir(dir)
        .stdin(Stdio::inherit())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let output = command.output().map_err(|e| ExecutionError::Spawn {
        command: display.to_string(),
        error: e.to_string(),
    })?;

    Ok(CommandOutput {
        exit_code: exit_code(output.status),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// Real exit code, or `128 + signal` for a child killed by a signal
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    UNKNOWN_EXIT_CODE
}
