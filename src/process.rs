//! Subprocess helpers shared by the Blender executor and the wheel builder.

use crate::error::{BuildError, Result};
use std::process::{Command, ExitStatus, Output, Stdio};

/// Render a command line for logging.
pub fn display_command(cmd: &Command) -> String {
    let mut line = cmd.get_program().to_string_lossy().into_owned();
    for arg in cmd.get_args() {
        let arg = arg.to_string_lossy();
        line.push(' ');
        if arg.contains(char::is_whitespace) {
            line.push('\'');
            line.push_str(&arg);
            line.push('\'');
        } else {
            line.push_str(&arg);
        }
    }
    line
}

fn program_name(cmd: &Command) -> String {
    std::path::Path::new(cmd.get_program())
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| cmd.get_program().to_string_lossy().into_owned())
}

fn exit_code(status: &ExitStatus) -> String {
    status
        .code()
        .map(|code| format!("status {code}"))
        .unwrap_or_else(|| "a signal".to_string())
}

/// Run a command with inherited stdio, failing on a non-zero exit.
pub fn run_streamed(cmd: &mut Command) -> Result<()> {
    tracing::info!("Executing: {}", display_command(cmd));

    let status = cmd.status()?;
    if !status.success() {
        return Err(BuildError::SubprocessFailed {
            program: program_name(cmd),
            code: exit_code(&status),
            detail: "see output above".to_string(),
        });
    }

    Ok(())
}

/// Run a command capturing stdout and stderr, failing on a non-zero exit.
pub fn run_captured(cmd: &mut Command) -> Result<Output> {
    tracing::info!("Executing: {}", display_command(cmd));

    let output = cmd
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stdout.is_empty() {
        tracing::debug!("stdout:\n{}", stdout);
    }
    if !stderr.is_empty() {
        tracing::debug!("stderr:\n{}", stderr);
    }

    if !output.status.success() {
        return Err(BuildError::SubprocessFailed {
            program: program_name(cmd),
            code: exit_code(&output.status),
            detail: format!("stdout: {}\nstderr: {}", stdout, stderr),
        });
    }

    Ok(output)
}
