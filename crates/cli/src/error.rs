// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// All possible errors that can occur in the ntpctl library.
///
/// Errors provide user-friendly messages with hints for common issues.
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot connect to ntpsvcd at {endpoint}: {source}\n  hint: is the ntpsvcd daemon running?")]
    Connect {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Daemon(String),

    #[error("unexpected response from daemon: {0}")]
    UnexpectedResponse(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for ntpctl operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
