// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for ntp-core operations.

use std::path::PathBuf;

use thiserror::Error;

/// All possible errors that can occur in ntp-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot access {}: {source}", path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to spawn '{command}': {source}")]
    CommandSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("command '{command}' failed ({}): {stderr}", code.map_or("killed by signal".to_string(), |c| format!("exit code {c}")))]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("cannot back up ntpsec configuration: {0}")]
    Backup(String),

    #[error("disabling ntpsec default configurations failed: {0}")]
    DisableDefaults(String),

    #[error("copying ntp-classic directives to ntpsec failed: {0}")]
    CopyDirectives(String),

    #[error("writing migration marker {} failed: {reason}", path.display())]
    Marker { path: PathBuf, reason: String },

    #[error("cannot check migration requirement for {}: {source}", path.display())]
    Precondition {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },

    #[error("ntp configuration not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("invalid ntp server '{0}'\n  hint: server entries must be non-empty single-line values")]
    InvalidServer(String),
}

impl Error {
    /// Wraps an I/O error together with the path it occurred on.
    pub fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::FileAccess { path: path.into(), source }
    }

    /// True if the command ran and exited unsuccessfully (as opposed to not spawning).
    pub fn is_command_exit(&self) -> bool {
        matches!(self, Error::CommandFailed { .. })
    }
}

/// A specialized Result type for ntp-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
