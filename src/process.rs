//! External process execution
//!
//! Every external tool (git, the build engine, cachix, the action script)
//! goes through these two functions. Captured runs buffer stdout and stderr
//! for error reports; streamed runs hand the child our own stdio so long
//! builds show live progress.

use crate::error::{MakesError, MakesResult};
use std::ffi::OsStr;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use tokio::process::Command;
use tracing::debug;

/// Exit code used when a child terminates without one (killed by a signal)
pub const SIGNALED_EXIT_CODE: i32 = 1;

/// Result of a captured process run
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Exit code of the child
    pub code: i32,
    /// Captured standard output
    pub stdout: Vec<u8>,
    /// Captured standard error
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    /// Whether the child exited with status 0
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(SIGNALED_EXIT_CODE)
}

fn describe<S: AsRef<OsStr>>(program: &Path, args: &[S]) -> String {
    let mut line = program.display().to_string();
    for arg in args {
        line.push(' ');
        line.push_str(&arg.as_ref().to_string_lossy());
    }
    line
}

/// Run a command to completion, capturing stdout and stderr
pub async fn run_captured<S: AsRef<OsStr>>(
    program: impl AsRef<Path>,
    args: &[S],
    cwd: Option<&Path>,
) -> MakesResult<CommandOutput> {
    let program = program.as_ref();
    let command_line = describe(program, args);
    debug!("Executing: {}", command_line);

    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }

    let output = cmd
        .output()
        .await
        .map_err(|e| MakesError::command_failed(command_line, e))?;

    Ok(CommandOutput {
        code: exit_code(output.status),
        stdout: output.stdout,
        stderr: output.stderr,
    })
}

/// Run a command with inherited stdio, returning its exit code
pub async fn run_streamed<S: AsRef<OsStr>>(
    program: impl AsRef<Path>,
    args: &[S],
    cwd: Option<&Path>,
) -> MakesResult<i32> {
    let program = program.as_ref();
    let command_line = describe(program, args);
    debug!("Executing interactively: {}", command_line);

    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }

    let status = cmd
        .status()
        .await
        .map_err(|e| MakesError::command_failed(command_line, e))?;

    Ok(exit_code(status))
}
