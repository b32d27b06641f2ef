// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Reading and rewriting the live ntp server list.

use std::io::{self, BufReader};
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Local};

use crate::command::CommandRunner;
use crate::error::{Error, Result};
use crate::directive::lines;
use crate::fileutil::FileUtil;
use crate::fs::FileSystem;
use crate::paths::{Paths, ServiceCommands};

#[cfg(test)]
#[path = "configurator_tests.rs"]
mod tests;

/// Format of the last-configured-time record.
pub const LAST_CONFIG_TIME_FORMAT: &str = "%Y.%m.%d %H:%M:%S";

/// Lines starting with these keywords are replaced on every write.
const REPLACED_KEYWORDS: [&str; 2] = ["pool", "server"];

/// Replaces the active server list.
pub trait ConfigWriter: Send + Sync {
    /// Rewrites the live config to exactly `servers`, then forces a resync.
    fn write(&self, servers: &[String]) -> Result<()>;

    /// Stores `when` as the last time the server list was changed.
    fn record_configuration_time(&self, when: DateTime<Local>) -> Result<()>;
}

/// Reads the active server list.
pub trait ConfigReader: Send + Sync {
    fn current_servers(&self) -> Result<Vec<String>>;
}

/// Stops the service, steps the clock once, and starts the service again.
///
/// The resync only runs if the stop succeeded; the start is always attempted
/// so the service is not left stopped. Returns the first failure.
pub fn force_resync(runner: &dyn CommandRunner, commands: &ServiceCommands) -> Result<()> {
    tracing::info!("forcing clock resynchronization");
    let resynced = runner.run(&commands.stop).and_then(|_| runner.run(&commands.force_resync));
    let started = runner.run(&commands.start);
    resynced.and(started).map(drop)
}

/// File-backed [`ConfigReader`] and [`ConfigWriter`] for the live ntpsec config.
pub struct NtpConfigurator {
    fs: Arc<dyn FileSystem>,
    files: Arc<dyn FileUtil>,
    runner: Arc<dyn CommandRunner>,
    paths: Paths,
    commands: ServiceCommands,
}

impl NtpConfigurator {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        files: Arc<dyn FileUtil>,
        runner: Arc<dyn CommandRunner>,
        paths: Paths,
        commands: ServiceCommands,
    ) -> Self {
        NtpConfigurator { fs, files, runner, paths, commands }
    }

    /// Removes every `pool`/`server` line and blank line, then appends one
    /// `server <entry>` line per entry.
    pub fn replace_servers(&self, servers: &[String]) -> Result<()> {
        let mut rebuilt = Vec::new();
        for line in self.read_config()? {
            let trimmed = line.trim_ascii();
            if trimmed.is_empty() || REPLACED_KEYWORDS.iter().any(|k| trimmed.starts_with(k.as_bytes())) {
                continue;
            }
            rebuilt.extend_from_slice(&line);
            rebuilt.push(b'\n');
        }
        for server in servers {
            rebuilt.extend_from_slice(b"server ");
            rebuilt.extend_from_slice(server.trim().as_bytes());
            rebuilt.push(b'\n');
        }

        self.files.create_or_update(&self.paths.config, &rebuilt)
    }

    fn read_config(&self) -> Result<Vec<Vec<u8>>> {
        read_config(self.fs.as_ref(), &self.paths.config)
    }
}

/// The live config as raw lines; the file need not be UTF-8.
fn read_config(fs: &dyn FileSystem, path: &Path) -> Result<Vec<Vec<u8>>> {
    let file = fs.open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => Error::ConfigNotFound(path.to_path_buf()),
        _ => Error::file(path, e),
    })?;
    lines(BufReader::new(file)).collect::<io::Result<_>>().map_err(|e| Error::file(path, e))
}

/// Rejects entries that would break the line-oriented config format.
pub fn validate_servers(servers: &[String]) -> Result<()> {
    match servers.iter().find(|s| s.trim().is_empty() || s.contains(['\n', '\r'])) {
        Some(bad) => Err(Error::InvalidServer(bad.clone())),
        None => Ok(()),
    }
}

impl ConfigWriter for NtpConfigurator {
    fn write(&self, servers: &[String]) -> Result<()> {
        validate_servers(servers)?;
        self.replace_servers(servers)?;
        tracing::info!("ntp servers set to {:?}", servers);
        force_resync(self.runner.as_ref(), &self.commands)
    }

    fn record_configuration_time(&self, when: DateTime<Local>) -> Result<()> {
        let path = &self.paths.last_config;
        if let Some(parent) = path.parent() {
            self.fs.mkdir_all(parent).map_err(|e| Error::file(parent, e))?;
        }
        let stamp = when.format(LAST_CONFIG_TIME_FORMAT).to_string();
        self.files.create_or_update(path, stamp.as_bytes())?;
        tracing::info!("ntp last configuration time: {stamp}");
        Ok(())
    }
}

impl ConfigReader for NtpConfigurator {
    fn current_servers(&self) -> Result<Vec<String>> {
        let config = self.read_config()?;
        Ok(config
            .iter()
            .filter_map(|line| line.trim_ascii().strip_prefix(b"server"))
            .filter(|rest| rest.first().is_some_and(u8::is_ascii_whitespace))
            .map(|rest| String::from_utf8_lossy(rest.trim_ascii()).into_owned())
            .collect())
    }
}
