// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Synchronous shell command execution.

use std::process::{Command, Stdio};

use crate::error::{Error, Result};

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;

/// Runs a shell command to completion and returns its standard output.
pub trait CommandRunner: Send + Sync {
    /// Runs `command`. A non-zero exit is [`Error::CommandFailed`]; a process
    /// that could not be started is [`Error::CommandSpawn`].
    fn run(&self, command: &str) -> Result<String>;
}

/// [`CommandRunner`] that executes through `bash -c`.
#[derive(Debug, Clone)]
pub struct ShellRunner {
    shell: String,
}

impl Default for ShellRunner {
    fn default() -> Self {
        ShellRunner { shell: "bash".to_string() }
    }
}

impl ShellRunner {
    /// Uses a different shell binary (must accept `-c <command>`).
    pub fn with_shell(shell: impl Into<String>) -> Self {
        ShellRunner { shell: shell.into() }
    }
}

impl CommandRunner for ShellRunner {
    fn run(&self, command: &str) -> Result<String> {
        let output = Command::new(&self.shell)
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| Error::CommandSpawn { command: command.to_string(), source })?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            Err(Error::CommandFailed {
                command: command.to_string(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}
