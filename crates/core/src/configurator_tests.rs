// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::fileutil::FsFileUtil;
use crate::testing::{FsOp, MemoryFs, ScriptedRunner};
use chrono::TimeZone;
use yare::parameterized;

const CONFIG: &str = "/etc/ntpsec/ntp.conf";

fn configurator(fs: &MemoryFs, runner: &ScriptedRunner) -> NtpConfigurator {
    let shared: Arc<dyn FileSystem> = Arc::new(fs.clone());
    NtpConfigurator::new(
        Arc::clone(&shared),
        Arc::new(FsFileUtil::new(shared)),
        Arc::new(runner.clone()),
        Paths::default(),
        ServiceCommands::default(),
    )
}

fn servers(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn write_replaces_servers_pools_and_blank_lines() {
    let fs = MemoryFs::new().with_file(
        CONFIG,
        "driftfile /var/lib/ntpsec/ntp.drift\n\nserver old.example\npool 2.debian.pool.ntp.org iburst\n#server disabled.example #iedk-migration\ntos maxclock 11 #iedk-migration\nrestrict default kod",
    );
    let runner = ScriptedRunner::new();

    configurator(&fs, &runner).write(&servers(&["0.tr.pool.ntp.org", "time.example iburst"])).unwrap();

    assert_eq!(
        fs.read(CONFIG).unwrap(),
        "driftfile /var/lib/ntpsec/ntp.drift\n#server disabled.example #iedk-migration\ntos maxclock 11 #iedk-migration\nrestrict default kod\nserver 0.tr.pool.ntp.org\nserver time.example iburst\n"
    );
}

#[test]
fn write_forces_resync_in_order() {
    let fs = MemoryFs::new().with_file(CONFIG, "");
    let runner = ScriptedRunner::new();

    configurator(&fs, &runner).write(&servers(&["a.example"])).unwrap();

    let commands = ServiceCommands::default();
    assert_eq!(runner.commands(), vec![commands.stop, commands.force_resync, commands.start]);
}

#[test]
fn write_returns_resync_failure_but_keeps_new_config() {
    let fs = MemoryFs::new().with_file(CONFIG, "server old.example\n");
    let runner = ScriptedRunner::new();
    let commands = ServiceCommands::default();
    runner.fail(&commands.force_resync, 124);

    let err = configurator(&fs, &runner).write(&servers(&["new.example"])).unwrap_err();

    assert!(err.is_command_exit());
    assert_eq!(fs.read(CONFIG).unwrap(), "server new.example\n");
    assert!(runner.ran(&commands.start));
}

#[test]
fn write_surfaces_missing_config_without_running_commands() {
    let fs = MemoryFs::new();
    let runner = ScriptedRunner::new();

    let err = configurator(&fs, &runner).write(&servers(&["a.example"])).unwrap_err();

    assert!(matches!(err, Error::ConfigNotFound(_)));
    assert!(runner.commands().is_empty());
}

#[test]
fn write_surfaces_rewrite_failure() {
    let fs = MemoryFs::new().with_file(CONFIG, "server a\n");
    fs.fail(FsOp::Create, CONFIG, io::ErrorKind::PermissionDenied);
    let runner = ScriptedRunner::new();

    assert!(configurator(&fs, &runner).write(&servers(&["b"])).is_err());
    assert!(runner.commands().is_empty());
}

#[parameterized(
    empty = { &[""] },
    whitespace = { &["  "] },
    newline = { &["a.example\nserver evil.example"] },
    carriage_return = { &["a.example\r"] },
)]
fn validate_rejects(list: &[&str]) {
    assert!(matches!(validate_servers(&servers(list)), Err(Error::InvalidServer(_))));
}

#[test]
fn validate_accepts_options_and_empty_list() {
    assert!(validate_servers(&servers(&["0.pool.ntp.org iburst prefer"])).is_ok());
    assert!(validate_servers(&[]).is_ok());
}

#[test]
fn current_servers_lists_active_server_arguments() {
    let fs = MemoryFs::new().with_file(
        CONFIG,
        "#server disabled #iedk-migration\nserver 0.tr.pool.ntp.org\n  server 1.tr.pool.ntp.org iburst \nservers-are-not-a-directive\npool 2.pool.ntp.org\nserver 3.tr.pool.ntp.org #iedk-migration",
    );

    let list = configurator(&fs, &ScriptedRunner::new()).current_servers().unwrap();

    assert_eq!(
        list,
        vec!["0.tr.pool.ntp.org", "1.tr.pool.ntp.org iburst", "3.tr.pool.ntp.org #iedk-migration"]
    );
}

#[test]
fn current_servers_missing_config_is_error() {
    let err = configurator(&MemoryFs::new(), &ScriptedRunner::new()).current_servers().unwrap_err();
    assert!(matches!(err, Error::ConfigNotFound(_)));
}

#[test]
fn force_resync_skips_resync_when_stop_fails_but_still_starts() {
    let runner = ScriptedRunner::new();
    let commands = ServiceCommands::default();
    runner.fail(&commands.stop, 5);

    let err = force_resync(&runner, &commands).unwrap_err();

    assert!(err.to_string().contains(&commands.stop));
    assert_eq!(runner.commands(), vec![commands.stop.clone(), commands.start.clone()]);
}

#[test]
fn record_configuration_time_writes_formatted_stamp() {
    let fs = MemoryFs::new();
    let when = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();

    configurator(&fs, &ScriptedRunner::new()).record_configuration_time(when).unwrap();

    assert_eq!(fs.read("/etc/iedk/lastntpconfigdate.rec").unwrap(), "2024.03.09 14:05:07");
}

#[test]
fn non_utf8_comments_survive_server_replacement() {
    let fs = MemoryFs::new().with_file(CONFIG, b"# Zeitserver f\xfcr Werk 1\nserver old.example\n");

    let ntp = configurator(&fs, &ScriptedRunner::new());
    assert_eq!(ntp.current_servers().unwrap(), vec!["old.example"]);
    ntp.write(&servers(&["0.tr.pool.ntp.org"])).unwrap();

    assert_eq!(
        fs.read_bytes(CONFIG).unwrap(),
        b"# Zeitserver f\xfcr Werk 1\nserver 0.tr.pool.ntp.org\n"
    );
}
