// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Startup migrations.
//!
//! Migrations run once, in order, before the daemon accepts connections. Each
//! one is idempotent: a marker file or the presence of its destination turns
//! it into a no-op. A failing migration is logged and the next one still runs.

mod ntpsec;
mod relocate;

pub use ntpsec::ConfigFormatMigration;
pub use relocate::RelocationMigration;

use std::sync::Arc;

use crate::command::CommandRunner;
use crate::error::Result;
use crate::fileutil::FileUtil;
use crate::fs::FileSystem;
use crate::paths::{Paths, ServiceCommands};

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

/// How a migration run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The migration changed the system.
    Migrated,
    /// Already done, or nothing to migrate.
    Skipped,
    /// No legacy input: defaults were disabled and the marker was written
    /// as not-upgraded.
    NotUpgraded,
    /// A best-effort migration failed; the failure has been logged.
    Abandoned,
}

/// A one-shot startup migration.
pub trait Migration: Send + Sync {
    /// Short human-readable name used in logs.
    fn name(&self) -> &'static str;

    /// Runs the migration if it is required.
    fn run(&self) -> Result<Outcome>;
}

/// The startup migrations in the order they must run.
pub fn startup_migrations(
    fs: Arc<dyn FileSystem>,
    files: Arc<dyn FileUtil>,
    runner: Arc<dyn CommandRunner>,
    paths: &Paths,
    commands: &ServiceCommands,
) -> Vec<Box<dyn Migration>> {
    vec![
        Box::new(RelocationMigration::last_sync(Arc::clone(&fs), Arc::clone(&files), paths)),
        Box::new(RelocationMigration::last_configuration_time(
            Arc::clone(&fs),
            Arc::clone(&files),
            paths,
        )),
        Box::new(ConfigFormatMigration::new(fs, files, runner, paths.clone(), commands.clone())),
    ]
}

/// Runs every migration in order. Failures are logged and do not stop the
/// remaining migrations; the per-migration results are returned.
pub fn run_all(migrations: &[Box<dyn Migration>]) -> Vec<Result<Outcome>> {
    migrations
        .iter()
        .map(|migration| {
            let result = migration.run();
            match &result {
                Ok(outcome) => tracing::info!("migration `{}`: {outcome:?}", migration.name()),
                Err(e) => tracing::error!("migration `{}` failed: {e}", migration.name()),
            }
            result
        })
        .collect()
}
