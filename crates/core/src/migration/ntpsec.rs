// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Migration from the ntp-classic configuration to ntpsec.
//!
//! ```text
//! NotStarted ──backup──▶ BackedUp ──disable + copy──▶ Mutated ──marker──▶ Finalized
//!     │                      │
//!     │                      └── failure: rename backup over config (rollback)
//!     └── no legacy config: disable defaults, marker "<version> #not-upgraded"
//! ```
//!
//! A marker write failure after a successful mutation is returned without
//! rolling back; the mutated config is kept.

use std::io::{BufReader, Write};
use std::path::Path;
use std::sync::Arc;

use super::{Migration, Outcome};
use crate::command::CommandRunner;
use crate::configurator::force_resync;
use crate::directive::Directives;
use crate::error::{Error, Result};
use crate::fileutil::FileUtil;
use crate::fs::FileSystem;
use crate::paths::{Paths, ServiceCommands, NOT_UPGRADED_TAG};

#[cfg(test)]
#[path = "ntpsec_tests.rs"]
mod tests;

pub struct ConfigFormatMigration {
    fs: Arc<dyn FileSystem>,
    files: Arc<dyn FileUtil>,
    runner: Arc<dyn CommandRunner>,
    paths: Paths,
    commands: ServiceCommands,
}

impl ConfigFormatMigration {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        files: Arc<dyn FileUtil>,
        runner: Arc<dyn CommandRunner>,
        paths: Paths,
        commands: ServiceCommands,
    ) -> Self {
        ConfigFormatMigration { fs, files, runner, paths, commands }
    }

    /// True iff no marker exists and the legacy config is a plain file.
    ///
    /// Unlike the relocations, a failed existence check is an error here.
    pub fn is_required(&self) -> Result<bool> {
        let (marker_exists, legacy_exists) = self.existence()?;
        Ok(!marker_exists && legacy_exists)
    }

    fn existence(&self) -> Result<(bool, bool)> {
        let marker = self.exists(&self.paths.migration_marker)?;
        let legacy = self.exists(&self.paths.legacy_config)?;
        Ok((marker, legacy))
    }

    fn exists(&self, path: &Path) -> Result<bool> {
        self.files
            .exists_as_file(path)
            .map_err(|e| Error::Precondition { path: path.to_path_buf(), source: Box::new(e) })
    }

    fn directives(&self) -> Directives<'_> {
        Directives::new(&self.paths.directive_keywords, &self.paths.migration_tag)
    }

    fn migrate(&self) -> Result<Outcome> {
        self.backup()?;

        if let Err(e) = self.disable_defaults().and_then(|()| self.copy_directives()) {
            self.rollback();
            return Err(e);
        }

        self.write_marker(true)?;
        self.finalize();

        tracing::info!("migration from ntp-classic to ntpsec completed");
        Ok(Outcome::Migrated)
    }

    fn backup(&self) -> Result<()> {
        let (config, backup) = (&self.paths.config, &self.paths.config_backup);
        self.files.copy(config, backup).map_err(|e| Error::Backup(e.to_string()))?;
        tracing::info!("backed up {} to {}", config.display(), backup.display());
        Ok(())
    }

    /// Comments out and tags every directive of the live config.
    fn disable_defaults(&self) -> Result<()> {
        let config = &self.paths.config;
        let file = self.fs.open(config).map_err(|e| {
            Error::DisableDefaults(format!("{} not found: {e}", config.display()))
        })?;
        let rebuilt = self
            .directives()
            .disable(BufReader::new(file))
            .map_err(|e| Error::DisableDefaults(format!("cannot read {}: {e}", config.display())))?;

        self.files
            .create_or_update(config, &rebuilt)
            .map_err(|e| Error::DisableDefaults(e.to_string()))
    }

    /// Appends the tagged legacy directives to the live config.
    ///
    /// An unreadable legacy config means there is nothing to copy.
    fn copy_directives(&self) -> Result<()> {
        let legacy = &self.paths.legacy_config;
        let file = match self.fs.open(legacy) {
            Ok(file) => file,
            Err(e) => {
                tracing::info!("{} not readable ({e}), no directives to copy", legacy.display());
                return Ok(());
            }
        };

        let lines = self
            .directives()
            .extract(BufReader::new(file))
            .map_err(|e| Error::CopyDirectives(format!("cannot read {}: {e}", legacy.display())))?;

        let config = &self.paths.config;
        let append = |e: std::io::Error| Error::CopyDirectives(format!("{}: {e}", config.display()));
        let mut out = self.fs.open_append(config).map_err(append)?;
        out.write_all(&lines.join(&b'\n')).map_err(append)?;
        out.flush().map_err(append)?;

        tracing::info!("copied {} directives from {}", lines.len(), legacy.display());
        Ok(())
    }

    fn rollback(&self) {
        let (config, backup) = (&self.paths.config, &self.paths.config_backup);
        match self.fs.rename(backup, config) {
            Ok(()) => tracing::info!("rolled back {} from {}", config.display(), backup.display()),
            Err(e) => tracing::error!("cannot roll back {} from {}: {e}", config.display(), backup.display()),
        }
    }

    fn write_marker(&self, upgraded: bool) -> Result<()> {
        let path = &self.paths.migration_marker;
        let marker = |reason: String| Error::Marker { path: path.clone(), reason };

        let content = if upgraded {
            self.paths.marker_version.clone()
        } else {
            format!("{} {NOT_UPGRADED_TAG}", self.paths.marker_version)
        };

        if let Some(parent) = path.parent() {
            self.fs.mkdir_all(parent).map_err(|e| marker(e.to_string()))?;
        }
        let mut file = self.fs.create(path).map_err(|e| marker(e.to_string()))?;
        file.write_all(content.as_bytes()).map_err(|e| marker(e.to_string()))?;
        file.flush().map_err(|e| marker(e.to_string()))
    }

    /// Best-effort cleanup once the marker is written.
    fn finalize(&self) {
        let backup = &self.paths.config_backup;
        if let Err(e) = self.fs.remove(backup) {
            tracing::warn!("cannot remove backup {}: {e}", backup.display());
        }
        if let Err(e) = force_resync(self.runner.as_ref(), &self.commands) {
            tracing::warn!("clock resynchronization after migration failed: {e}");
        }
    }
}

impl Migration for ConfigFormatMigration {
    fn name(&self) -> &'static str {
        "ntp-classic to ntpsec"
    }

    fn run(&self) -> Result<Outcome> {
        let (marker_exists, legacy_exists) = self.existence()?;

        if marker_exists {
            tracing::info!("ntpsec migration already done");
            return Ok(Outcome::Skipped);
        }
        if legacy_exists {
            tracing::info!("ntpsec migration is required");
            return self.migrate();
        }

        self.disable_defaults()?;
        self.write_marker(false)?;
        tracing::info!("no ntp-classic configuration, ntpsec defaults disabled");
        Ok(Outcome::NotUpgraded)
    }
}
