// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Moves a state file from a deprecated location to its current one.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{Migration, Outcome};
use crate::error::Result;
use crate::fileutil::FileUtil;
use crate::fs::FileSystem;
use crate::paths::Paths;

#[cfg(test)]
#[path = "relocate_tests.rs"]
mod tests;

/// Renames `source` to `destination` once.
///
/// Existence checks that fail are treated as "absent", and a failed move is
/// logged rather than returned: the migration leans towards skipping.
pub struct RelocationMigration {
    name: &'static str,
    fs: Arc<dyn FileSystem>,
    files: Arc<dyn FileUtil>,
    source: PathBuf,
    destination: PathBuf,
}

impl RelocationMigration {
    pub fn new(
        name: &'static str,
        fs: Arc<dyn FileSystem>,
        files: Arc<dyn FileUtil>,
        source: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
    ) -> Self {
        RelocationMigration { name, fs, files, source: source.into(), destination: destination.into() }
    }

    /// Relocates the last-sync-time record.
    pub fn last_sync(fs: Arc<dyn FileSystem>, files: Arc<dyn FileUtil>, paths: &Paths) -> Self {
        Self::new("last time sync info", fs, files, &paths.old_last_sync, &paths.last_sync)
    }

    /// Relocates the last-configured-time record.
    pub fn last_configuration_time(
        fs: Arc<dyn FileSystem>,
        files: Arc<dyn FileUtil>,
        paths: &Paths,
    ) -> Self {
        Self::new("last configuration time", fs, files, &paths.old_last_config, &paths.last_config)
    }

    /// True iff the destination is absent and the source is present.
    pub fn is_required(&self) -> bool {
        !self.exists(&self.destination) && self.exists(&self.source)
    }

    fn exists(&self, path: &Path) -> bool {
        match self.files.exists_as_file(path) {
            Ok(exists) => exists,
            Err(e) => {
                tracing::warn!("treating {} as absent: {e}", path.display());
                false
            }
        }
    }

    fn relocate(&self) -> std::io::Result<()> {
        if let Some(parent) = self.destination.parent() {
            self.fs.mkdir_all(parent)?;
        }
        self.fs.rename(&self.source, &self.destination)
    }
}

impl Migration for RelocationMigration {
    fn name(&self) -> &'static str {
        self.name
    }

    fn run(&self) -> Result<Outcome> {
        if !self.is_required() {
            tracing::info!("migration not required for `{}`", self.name);
            return Ok(Outcome::Skipped);
        }

        match self.relocate() {
            Ok(()) => {
                tracing::info!(
                    "moved {} to {}",
                    self.source.display(),
                    self.destination.display()
                );
                Ok(Outcome::Migrated)
            }
            Err(e) => {
                tracing::error!("migration failed for `{}`: {e}", self.name);
                Ok(Outcome::Abandoned)
            }
        }
    }
}
