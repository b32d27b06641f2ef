// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::fileutil::FsFileUtil;
use crate::testing::{FsCall, FsOp, MemoryFs, ScriptedRunner};
use std::io;

const LEGACY: &str = "/etc/ntp.conf";
const CONFIG: &str = "/etc/ntpsec/ntp.conf";
const BACKUP: &str = "/etc/ntpsec/ntp.conf.backup";
const MARKER: &str = "/etc/iedk/ntp/migration/ntpsec.migration";

const NTPSEC_DEFAULTS: &str = "tos maxclock 9\nserver 1.tr.pool.ntp.org\nrestrict default kod";
const CLASSIC: &str =
    "tos maxclock 11\nserver 0.tr.pool.ntp.org\npool 1.tr.pool.ntp.org\nrestrict default kod";

const DISABLED: &str =
    "#tos maxclock 9 #iedk-migration\n#server 1.tr.pool.ntp.org #iedk-migration\nrestrict default kod\n";
const COPIED: &str = "tos maxclock 11 #iedk-migration\nserver 0.tr.pool.ntp.org #iedk-migration\npool 1.tr.pool.ntp.org #iedk-migration";

fn migration(fs: &MemoryFs, runner: &ScriptedRunner) -> ConfigFormatMigration {
    let shared: Arc<dyn FileSystem> = Arc::new(fs.clone());
    ConfigFormatMigration::new(
        Arc::clone(&shared),
        Arc::new(FsFileUtil::new(shared)),
        Arc::new(runner.clone()),
        Paths::default(),
        ServiceCommands::default(),
    )
}

fn upgradable() -> MemoryFs {
    MemoryFs::new().with_file(CONFIG, NTPSEC_DEFAULTS).with_file(LEGACY, CLASSIC)
}

#[test]
fn migrates_legacy_directives() {
    let fs = upgradable();
    let runner = ScriptedRunner::new();

    assert_eq!(migration(&fs, &runner).run().unwrap(), Outcome::Migrated);

    assert_eq!(fs.read(CONFIG).unwrap(), format!("{DISABLED}{COPIED}"));
    assert_eq!(fs.read(MARKER).unwrap(), "1.2.x");
    assert!(!fs.is_file(BACKUP));
    assert_eq!(fs.read(LEGACY).unwrap(), CLASSIC);
}

#[test]
fn migration_forces_resync_after_marker() {
    let fs = upgradable();
    let runner = ScriptedRunner::new();

    migration(&fs, &runner).run().unwrap();

    let commands = ServiceCommands::default();
    assert_eq!(runner.commands(), vec![commands.stop, commands.force_resync, commands.start]);
}

#[test]
fn backup_exists_while_config_is_mutated() {
    let fs = upgradable();
    migration(&fs, &ScriptedRunner::new()).run().unwrap();

    let calls = fs.mutations();
    let backed_up = calls.iter().position(|c| *c == FsCall::Create(BACKUP.into())).unwrap();
    let first_write = calls.iter().position(|c| *c == FsCall::Create(CONFIG.into())).unwrap();
    let removed = calls.iter().position(|c| *c == FsCall::Remove(BACKUP.into())).unwrap();
    let marked = calls.iter().position(|c| *c == FsCall::Create(MARKER.into())).unwrap();

    assert!(backed_up < first_write);
    assert!(first_write < marked);
    assert!(marked < removed);
}

#[test]
fn running_twice_matches_running_once() {
    let fs = upgradable();
    let runner = ScriptedRunner::new();
    let migration = migration(&fs, &runner);

    migration.run().unwrap();
    let (config, marker) = (fs.read(CONFIG), fs.read(MARKER));

    assert_eq!(migration.run().unwrap(), Outcome::Skipped);
    assert_eq!(fs.read(CONFIG), config);
    assert_eq!(fs.read(MARKER), marker);
}

#[test]
fn existing_marker_is_a_no_op() {
    let fs = upgradable().with_file(MARKER, "1.2.x");
    let runner = ScriptedRunner::new();

    assert!(!migration(&fs, &runner).is_required().unwrap());
    assert_eq!(migration(&fs, &runner).run().unwrap(), Outcome::Skipped);

    assert!(fs.mutations().is_empty());
    assert!(runner.commands().is_empty());
    assert_eq!(fs.read(CONFIG).unwrap(), NTPSEC_DEFAULTS);
}

#[test]
fn existing_not_upgraded_marker_is_a_no_op() {
    let fs = upgradable().with_file(MARKER, "1.2.x #not-upgraded");

    assert_eq!(migration(&fs, &ScriptedRunner::new()).run().unwrap(), Outcome::Skipped);
    assert!(fs.mutations().is_empty());
}

#[test]
fn failed_append_rolls_back_byte_for_byte() {
    let fs = upgradable();
    fs.fail(FsOp::OpenAppend, CONFIG, io::ErrorKind::PermissionDenied);
    let runner = ScriptedRunner::new();

    let err = migration(&fs, &runner).run().unwrap_err();

    assert!(matches!(err, Error::CopyDirectives(_)));
    assert_eq!(fs.read(CONFIG).unwrap(), NTPSEC_DEFAULTS);
    assert!(!fs.is_file(BACKUP));
    assert!(!fs.is_file(MARKER));
    assert!(runner.commands().is_empty());
}

#[test]
fn failed_disable_rolls_back() {
    let fs = upgradable();
    fs.fail(FsOp::Create, CONFIG, io::ErrorKind::PermissionDenied);

    let err = migration(&fs, &ScriptedRunner::new()).run().unwrap_err();

    assert!(matches!(err, Error::DisableDefaults(_)));
    assert!(fs.mutations().contains(&FsCall::Rename(BACKUP.into(), CONFIG.into())));
    assert_eq!(fs.read(CONFIG).unwrap(), NTPSEC_DEFAULTS);
    assert!(!fs.is_file(MARKER));
}

#[test]
fn failed_backup_aborts_before_mutation() {
    let fs = upgradable();
    fs.fail(FsOp::Create, BACKUP, io::ErrorKind::PermissionDenied);
    let runner = ScriptedRunner::new();

    let err = migration(&fs, &runner).run().unwrap_err();

    assert!(matches!(err, Error::Backup(_)));
    assert!(!fs.mutations().contains(&FsCall::Create(CONFIG.into())));
    assert_eq!(fs.read(CONFIG).unwrap(), NTPSEC_DEFAULTS);
    assert!(!fs.is_file(MARKER));
    assert!(runner.commands().is_empty());
}

#[test]
fn missing_live_config_fails_backup() {
    let fs = MemoryFs::new().with_file(LEGACY, CLASSIC);

    let err = migration(&fs, &ScriptedRunner::new()).run().unwrap_err();

    assert!(matches!(err, Error::Backup(_)));
}

#[test]
fn failed_marker_keeps_mutation_without_rollback() {
    let fs = upgradable();
    fs.fail(FsOp::Create, MARKER, io::ErrorKind::PermissionDenied);
    let runner = ScriptedRunner::new();

    let err = migration(&fs, &runner).run().unwrap_err();

    assert!(matches!(err, Error::Marker { .. }));
    assert_eq!(fs.read(CONFIG).unwrap(), format!("{DISABLED}{COPIED}"));
    assert!(!fs.mutations().iter().any(|c| matches!(c, FsCall::Rename(..))));
    assert!(runner.commands().is_empty());
}

#[test]
fn unreadable_legacy_config_copies_nothing() {
    let fs = upgradable();
    fs.fail(FsOp::Open, LEGACY, io::ErrorKind::PermissionDenied);

    assert_eq!(migration(&fs, &ScriptedRunner::new()).run().unwrap(), Outcome::Migrated);

    assert_eq!(fs.read(CONFIG).unwrap(), DISABLED);
    assert_eq!(fs.read(MARKER).unwrap(), "1.2.x");
}

#[test]
fn repeated_legacy_directives_are_all_copied() {
    let fs = MemoryFs::new()
        .with_file(CONFIG, "")
        .with_file(LEGACY, "server a.example\nserver a.example\n");

    migration(&fs, &ScriptedRunner::new()).run().unwrap();

    assert_eq!(
        fs.read(CONFIG).unwrap(),
        "server a.example #iedk-migration\nserver a.example #iedk-migration"
    );
}

#[test]
fn cleanup_failures_do_not_fail_migration() {
    let fs = upgradable();
    fs.fail(FsOp::Remove, BACKUP, io::ErrorKind::PermissionDenied);
    let runner = ScriptedRunner::new();
    runner.fail(&ServiceCommands::default().force_resync, 124);

    assert_eq!(migration(&fs, &runner).run().unwrap(), Outcome::Migrated);
    assert_eq!(fs.read(MARKER).unwrap(), "1.2.x");
}

#[test]
fn without_legacy_config_disables_defaults_and_marks_not_upgraded() {
    let fs = MemoryFs::new().with_file(CONFIG, NTPSEC_DEFAULTS);
    let runner = ScriptedRunner::new();

    assert!(!migration(&fs, &runner).is_required().unwrap());
    assert_eq!(migration(&fs, &runner).run().unwrap(), Outcome::NotUpgraded);

    assert_eq!(fs.read(CONFIG).unwrap(), DISABLED);
    assert_eq!(fs.read(MARKER).unwrap(), "1.2.x #not-upgraded");
    assert!(!fs.mutations().contains(&FsCall::Create(BACKUP.into())));
    assert!(runner.commands().is_empty());
}

#[test]
fn skip_path_without_live_config_writes_no_marker() {
    let fs = MemoryFs::new();

    let err = migration(&fs, &ScriptedRunner::new()).run().unwrap_err();

    assert!(matches!(err, Error::DisableDefaults(_)));
    assert!(!fs.is_file(MARKER));
}

#[test]
fn failed_existence_check_is_surfaced() {
    let fs = upgradable();
    fs.fail(FsOp::Stat, MARKER, io::ErrorKind::PermissionDenied);

    let err = migration(&fs, &ScriptedRunner::new()).run().unwrap_err();

    assert!(matches!(err, Error::Precondition { .. }));
    assert!(fs.mutations().is_empty());
}

#[test]
fn marker_directory_is_not_a_marker() {
    let fs = upgradable();
    fs.add_dir(MARKER);

    assert!(migration(&fs, &ScriptedRunner::new()).is_required().unwrap());
}

#[test]
fn non_utf8_legacy_comment_does_not_block_migration() {
    let fs = MemoryFs::new()
        .with_file(CONFIG, NTPSEC_DEFAULTS)
        .with_file(LEGACY, b"# Zeitserver f\xfcr Werk 1\nserver 0.tr.pool.ntp.org\n");

    assert_eq!(migration(&fs, &ScriptedRunner::new()).run().unwrap(), Outcome::Migrated);

    assert_eq!(fs.read(CONFIG).unwrap(), format!("{DISABLED}server 0.tr.pool.ntp.org #iedk-migration"));
    assert_eq!(fs.read(MARKER).unwrap(), "1.2.x");
}

#[test]
fn non_utf8_live_config_is_disabled_byte_for_byte() {
    let fs = MemoryFs::new().with_file(CONFIG, b"# Pr\xfcfung\nserver 1.tr.pool.ntp.org\n");

    assert_eq!(migration(&fs, &ScriptedRunner::new()).run().unwrap(), Outcome::NotUpgraded);

    assert_eq!(
        fs.read_bytes(CONFIG).unwrap(),
        b"# Pr\xfcfung\n#server 1.tr.pool.ntp.org #iedk-migration\n"
    );
    assert_eq!(fs.read(MARKER).unwrap(), "1.2.x #not-upgraded");
}
