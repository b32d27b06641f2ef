// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration.
//!
//! Stored as TOML, by default in `/etc/iedk/ntp/ntpsvcd.toml`:
//!
//! ```toml
//! log_file = "/var/log/ntpsvcd.log"
//!
//! [service]
//! force_resync = "timeout 10 ntpd -gq"
//!
//! [socket]
//! group = "ntp"
//! mode = 0o640
//! ```
//!
//! Every key is optional. The file locations the migrations touch are fixed
//! and cannot be configured here.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use ntp_core::ServiceCommands;
use serde::Deserialize;
use thiserror::Error;

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

/// Default configuration file location.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/iedk/ntp/ntpsvcd.toml";
/// Default single-instance lock file.
pub const DEFAULT_LOCK_FILE: &str = "/run/ntpsvcd.lock";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid configuration in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Append logs here instead of stderr.
    pub log_file: Option<PathBuf>,
    pub lock_file: PathBuf,
    pub service: ServiceCommands,
    pub socket: SocketConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_file: None,
            lock_file: PathBuf::from(DEFAULT_LOCK_FILE),
            service: ServiceCommands::default(),
            socket: SocketConfig::default(),
        }
    }
}

/// Ownership and permissions applied to a Unix socket after binding.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SocketConfig {
    pub owner: String,
    pub group: String,
    pub mode: u32,
}

impl Default for SocketConfig {
    fn default() -> Self {
        SocketConfig { owner: "root".to_string(), group: "docker".to_string(), mode: 0o660 }
    }
}

impl Config {
    /// Parses configuration from TOML text.
    pub fn parse(path: &Path, text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    /// Loads configuration from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(text) => Self::parse(path, &text),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("no configuration at {}, using defaults", path.display());
                Ok(Config::default())
            }
            Err(source) => Err(ConfigError::Read { path: path.to_path_buf(), source }),
        }
    }
}

/// Resolves the configuration path: command line, then environment, then default.
pub fn config_path(cli: Option<PathBuf>) -> PathBuf {
    cli.or_else(crate::env::config_path).unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
