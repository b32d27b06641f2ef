// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Environment variables read by the daemon.

use std::path::PathBuf;

/// Generated environment variable name constants.
pub mod names {
    include!(concat!(env!("OUT_DIR"), "/env_names.rs"));
}

/// Returns the value of `NTPSVCD_CONFIG` if set and non-empty.
pub fn config_path() -> Option<PathBuf> {
    std::env::var(names::NTPSVCD_CONFIG)
        .ok()
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
