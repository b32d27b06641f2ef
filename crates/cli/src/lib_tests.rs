// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use ntp_ipc::{framing, DaemonRequest, DaemonResponse, NtpStatus};
use std::os::unix::net::UnixListener;
use std::thread;
use tempfile::TempDir;
use yare::parameterized;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("ntpctl").chain(args.iter().copied())).unwrap()
}

#[test]
fn default_endpoint_is_device_socket() {
    assert_eq!(parse(&["get"]).endpoint(), Endpoint::Unix("/tmp/devicemodel/ntp.socket".into()));
}

#[parameterized(
    unix_before = { &["--unix", "/run/ntp.sock", "get"], Endpoint::Unix("/run/ntp.sock".into()) },
    unix_after = { &["get", "--unix", "/run/ntp.sock"], Endpoint::Unix("/run/ntp.sock".into()) },
    tcp = { &["--tcp", "127.0.0.1:50051", "status"], Endpoint::Tcp("127.0.0.1:50051".to_string()) },
)]
fn endpoint_flags(args: &[&str], expected: Endpoint) {
    assert_eq!(parse(args).endpoint(), expected);
}

#[test]
fn set_collects_servers() {
    assert_eq!(
        parse(&["set", "a.example", "b.example iburst"]).command,
        Command::Set { servers: vec!["a.example".to_string(), "b.example iburst".to_string()] }
    );
}

#[parameterized(
    set_without_servers = { &["set"] },
    both_endpoints = { &["--unix", "/a", "--tcp", "b:1", "get"] },
    no_command = { &[] },
)]
fn rejected_arguments(args: &[&str]) {
    assert!(Cli::try_parse_from(std::iter::once("ntpctl").chain(args.iter().copied())).is_err());
}

/// Runs `command` against a daemon that answers with `response`.
fn execute_against(command: Command, response: DaemonResponse) -> Result<String> {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ntp.socket");
    let listener = UnixListener::bind(&path).unwrap();
    thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let _: DaemonRequest = framing::read_message(&mut stream).unwrap();
        framing::write_message(&mut stream, &response).unwrap();
    });

    let mut out = Vec::new();
    execute(&Endpoint::Unix(path), command, &mut out)?;
    Ok(String::from_utf8(out).unwrap())
}

#[test]
fn get_prints_servers() {
    let out = execute_against(
        Command::Get,
        DaemonResponse::Servers { servers: vec!["a.example".to_string(), "b.example".to_string()] },
    )
    .unwrap();
    assert_eq!(out, "a.example\nb.example\n");
}

#[test]
fn set_reports_count() {
    let out = execute_against(
        Command::Set { servers: vec!["a.example".to_string()] },
        DaemonResponse::Applied,
    )
    .unwrap();
    assert_eq!(out, "ntp servers updated (1)\n");
}

#[test]
fn status_json_is_parseable() {
    let status = NtpStatus { running: true, ..Default::default() };
    let out = execute_against(Command::Status { json: true }, DaemonResponse::Status(status.clone()))
        .unwrap();
    assert_eq!(serde_json::from_str::<NtpStatus>(&out).unwrap(), status);
}

#[test]
fn daemon_error_is_returned() {
    let err = execute_against(
        Command::Get,
        DaemonResponse::Error { message: "ntp configuration not found".to_string() },
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "ntp configuration not found");
}
