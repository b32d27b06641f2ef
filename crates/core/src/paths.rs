// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Fixed on-disk locations and service commands.
//!
//! Production code uses `Paths::default()`; tests re-root every path under a
//! temporary directory with [`Paths::rooted`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "paths_tests.rs"]
mod tests;

/// Legacy (ntp-classic) configuration file.
pub const LEGACY_CONFIG_PATH: &str = "/etc/ntp.conf";
/// Live (ntpsec) configuration file.
pub const CONFIG_PATH: &str = "/etc/ntpsec/ntp.conf";
/// Transient backup of the live configuration during migration.
pub const CONFIG_BACKUP_PATH: &str = "/etc/ntpsec/ntp.conf.backup";
/// Marker recording that the config-format migration ran.
pub const MIGRATION_MARKER_PATH: &str = "/etc/iedk/ntp/migration/ntpsec.migration";
/// Deprecated location of the last-configured-time record.
pub const OLD_LAST_CONFIG_PATH: &str = "/opt/lastntpconfigdate.rec";
/// Current location of the last-configured-time record.
pub const LAST_CONFIG_PATH: &str = "/etc/iedk/lastntpconfigdate.rec";
/// Version written into the migration marker.
pub const MARKER_VERSION: &str = "1.2.x";
/// Suffix attached to the marker when no legacy configuration was migrated.
pub const NOT_UPGRADED_TAG: &str = "#not-upgraded";
/// Provenance tag attached to every migrated or disabled directive line.
pub const MIGRATION_TAG: &str = "#iedk-migration";
/// Directive keywords, matched in this order.
pub const DIRECTIVE_KEYWORDS: [&str; 3] = ["server", "tos", "pool"];

/// Every path and constant the engine touches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub legacy_config: PathBuf,
    pub config: PathBuf,
    pub config_backup: PathBuf,
    pub migration_marker: PathBuf,
    pub old_last_config: PathBuf,
    pub last_config: PathBuf,
    /// Deprecated location of the last-sync record.
    ///
    /// Historically the same file as the last-configured-time record.
    pub old_last_sync: PathBuf,
    pub last_sync: PathBuf,
    pub marker_version: String,
    pub migration_tag: String,
    pub directive_keywords: Vec<String>,
}

impl Default for Paths {
    fn default() -> Self {
        Paths {
            legacy_config: PathBuf::from(LEGACY_CONFIG_PATH),
            config: PathBuf::from(CONFIG_PATH),
            config_backup: PathBuf::from(CONFIG_BACKUP_PATH),
            migration_marker: PathBuf::from(MIGRATION_MARKER_PATH),
            old_last_config: PathBuf::from(OLD_LAST_CONFIG_PATH),
            last_config: PathBuf::from(LAST_CONFIG_PATH),
            old_last_sync: PathBuf::from(OLD_LAST_CONFIG_PATH),
            last_sync: PathBuf::from(LAST_CONFIG_PATH),
            marker_version: MARKER_VERSION.to_string(),
            migration_tag: MIGRATION_TAG.to_string(),
            directive_keywords: DIRECTIVE_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

impl Paths {
    /// Default paths re-rooted under `root` (`/etc/ntp.conf` -> `<root>/etc/ntp.conf`).
    pub fn rooted(root: &Path) -> Self {
        let defaults = Paths::default();
        let reroot = |p: &Path| root.join(p.strip_prefix("/").unwrap_or(p));
        Paths {
            legacy_config: reroot(&defaults.legacy_config),
            config: reroot(&defaults.config),
            config_backup: reroot(&defaults.config_backup),
            migration_marker: reroot(&defaults.migration_marker),
            old_last_config: reroot(&defaults.old_last_config),
            last_config: reroot(&defaults.last_config),
            old_last_sync: reroot(&defaults.old_last_sync),
            last_sync: reroot(&defaults.last_sync),
            ..defaults
        }
    }
}

/// Shell commands used to control and inspect the time-sync service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceCommands {
    pub stop: String,
    /// Bounded-duration command that steps the clock once and exits.
    pub force_resync: String,
    pub start: String,
    /// Exits 0 iff the service is running.
    pub is_running: String,
    pub peers: String,
}

impl Default for ServiceCommands {
    fn default() -> Self {
        ServiceCommands {
            stop: "systemctl stop ntpsec.service".to_string(),
            force_resync: "timeout 30 ntpd -gq".to_string(),
            start: "systemctl start ntpsec.service".to_string(),
            is_running: "systemctl is-active --quiet ntpsec".to_string(),
            peers: "ntpq -pn".to_string(),
        }
    }
}
