// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Service status: running flag, peers from `ntpq -pn`, sync and
//! configuration times.

use std::io;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};

use crate::command::CommandRunner;
use crate::error::{Error, Result};
use crate::fileutil::read_to_string;
use crate::fs::FileSystem;
use crate::paths::{Paths, ServiceCommands};

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;

/// Tally codes ntpq prints in front of the remote address.
const TALLY_CODES: &[char] = &['*', '+', '-', '#', 'o', 'x', '.'];

/// Number of header lines ntpq prints before the peer rows.
const PEER_HEADER_LINES: usize = 2;

/// One row of `ntpq -pn`.
#[derive(Debug, Clone, PartialEq)]
pub struct PeerRecord {
    /// Selection tally (`*` is the current system peer).
    pub tally: Option<char>,
    pub remote: String,
    pub refid: String,
    pub stratum: u8,
    pub peer_type: String,
    /// Seconds since the last packet was received.
    pub when_secs: u64,
    pub poll_secs: u64,
    /// Octal reachability register as printed.
    pub reach: String,
    pub delay_ms: f64,
    pub offset_ms: f64,
    pub jitter_ms: f64,
}

impl PeerRecord {
    pub fn is_system_peer(&self) -> bool {
        self.tally == Some('*')
    }
}

/// Snapshot of the time-sync service.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ServiceStatus {
    pub running: bool,
    pub synced: bool,
    pub last_sync_time: Option<DateTime<Utc>>,
    /// Raw content of the last-configured-time record.
    pub last_configuration_time: Option<String>,
    pub peers: Vec<PeerRecord>,
}

/// Reports the state of the time-sync service.
pub trait StatusReader: Send + Sync {
    fn status(&self) -> Result<ServiceStatus>;
}

/// Parses the output of `ntpq -pn`. Malformed rows are skipped.
pub fn parse_peers(output: &str) -> Vec<PeerRecord> {
    output.lines().skip(PEER_HEADER_LINES).filter_map(parse_peer_row).collect()
}

fn parse_peer_row(row: &str) -> Option<PeerRecord> {
    let fields: Vec<&str> = row.split_whitespace().collect();
    if fields.len() < 10 {
        tracing::debug!("skipping malformed peer row: {row}");
        return None;
    }

    let (tally, remote) = match fields[0].chars().next() {
        Some(c) if TALLY_CODES.contains(&c) => (Some(c), &fields[0][c.len_utf8()..]),
        _ => (None, fields[0]),
    };

    Some(PeerRecord {
        tally,
        remote: remote.to_string(),
        refid: fields[1].to_string(),
        stratum: fields[2].parse().ok()?,
        peer_type: fields[3].to_string(),
        when_secs: parse_interval(fields[4]),
        poll_secs: parse_interval(fields[5]),
        reach: fields[6].to_string(),
        delay_ms: fields[7].parse().ok()?,
        offset_ms: fields[8].parse().ok()?,
        jitter_ms: fields[9].parse().ok()?,
    })
}

/// Parses ntpq's compact interval: `-`, `35`, `2m`, `1h`, `3d`.
///
/// Values too large for `u64` saturate.
pub fn parse_interval(field: &str) -> u64 {
    let (digits, scale) = match field.char_indices().last() {
        Some((i, 'm')) => (&field[..i], 60),
        Some((i, 'h')) => (&field[..i], 60 * 60),
        Some((i, 'd')) => (&field[..i], 24 * 60 * 60),
        _ => (field, 1),
    };
    digits.parse::<u64>().map(|n| n.saturating_mul(scale)).unwrap_or(0)
}

/// Sync state derived from the peer list: synced iff a system peer has
/// received a packet, last sync is `now - when` for that peer (`None` when
/// that instant is out of range).
pub fn sync_state(peers: &[PeerRecord], now: DateTime<Utc>) -> (bool, Option<DateTime<Utc>>) {
    let system_peer = peers.iter().find(|p| p.is_system_peer() && p.when_secs > 0);
    match system_peer {
        Some(peer) => {
            let last_sync = i64::try_from(peer.when_secs)
                .ok()
                .and_then(TimeDelta::try_seconds)
                .and_then(|when| now.checked_sub_signed(when));
            (true, last_sync)
        }
        None => (false, None),
    }
}

/// [`StatusReader`] that asks systemd and ntpq.
pub struct NtpStatusReader {
    fs: Arc<dyn FileSystem>,
    runner: Arc<dyn CommandRunner>,
    paths: Paths,
    commands: ServiceCommands,
}

impl NtpStatusReader {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        runner: Arc<dyn CommandRunner>,
        paths: Paths,
        commands: ServiceCommands,
    ) -> Self {
        NtpStatusReader { fs, runner, paths, commands }
    }

    /// Status as seen at `now`.
    pub fn status_at(&self, now: DateTime<Utc>) -> ServiceStatus {
        let running = self.is_running();
        let peers = self.peers();
        let (synced, last_sync_time) = sync_state(&peers, now);
        let last_configuration_time = self.last_configuration_time();

        tracing::debug!(running, synced, peers = peers.len(), "ntp status collected");
        ServiceStatus { running, synced, last_sync_time, last_configuration_time, peers }
    }

    fn is_running(&self) -> bool {
        match self.runner.run(&self.commands.is_running) {
            Ok(_) => true,
            Err(e @ Error::CommandFailed { .. }) => {
                tracing::info!("ntp service is not running: {e}");
                false
            }
            Err(e) => {
                tracing::warn!("cannot determine whether ntp service is running: {e}");
                false
            }
        }
    }

    fn peers(&self) -> Vec<PeerRecord> {
        match self.runner.run(&self.commands.peers) {
            Ok(output) => parse_peers(&output),
            Err(e) => {
                tracing::warn!("peer query failed: {e}");
                Vec::new()
            }
        }
    }

    fn last_configuration_time(&self) -> Option<String> {
        match read_to_string(self.fs.as_ref(), &self.paths.last_config) {
            Ok(content) => Some(content.trim().to_string()).filter(|s| !s.is_empty()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!("cannot read {}: {e}", self.paths.last_config.display());
                None
            }
        }
    }
}

impl StatusReader for NtpStatusReader {
    fn status(&self) -> Result<ServiceStatus> {
        Ok(self.status_at(Utc::now()))
    }
}
