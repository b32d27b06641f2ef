// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared IPC protocol for client-daemon communication.
//!
//! This crate defines the message types and framing protocol used between
//! the `ntpctl` client and the `ntpsvcd` daemon. Messages are serialized as
//! JSON with length-prefixed framing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Status types
// ============================================================================

/// One remote time source as reported by the daemon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerDetails {
    /// Selection tally (`*` marks the system peer).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tally: Option<char>,
    /// Remote address.
    pub remote: String,
    /// Reference id of the remote.
    pub refid: String,
    pub stratum: u8,
    /// Peer type code (`u` unicast, `p` pool, ...).
    #[serde(rename = "type")]
    pub peer_type: String,
    /// Seconds since the last received packet.
    pub when: u64,
    /// Poll interval in seconds.
    pub poll: u64,
    /// Octal reachability register.
    pub reach: String,
    /// Round-trip delay in milliseconds.
    pub delay: f64,
    /// Clock offset in milliseconds.
    pub offset: f64,
    /// Dispersion jitter in milliseconds.
    pub jitter: f64,
}

impl From<ntp_core::PeerRecord> for PeerDetails {
    fn from(peer: ntp_core::PeerRecord) -> Self {
        PeerDetails {
            tally: peer.tally,
            remote: peer.remote,
            refid: peer.refid,
            stratum: peer.stratum,
            peer_type: peer.peer_type,
            when: peer.when_secs,
            poll: peer.poll_secs,
            reach: peer.reach,
            delay: peer.delay_ms,
            offset: peer.offset_ms,
            jitter: peer.jitter_ms,
        }
    }
}

impl From<PeerDetails> for ntp_core::PeerRecord {
    fn from(peer: PeerDetails) -> Self {
        ntp_core::PeerRecord {
            tally: peer.tally,
            remote: peer.remote,
            refid: peer.refid,
            stratum: peer.stratum,
            peer_type: peer.peer_type,
            when_secs: peer.when,
            poll_secs: peer.poll,
            reach: peer.reach,
            delay_ms: peer.delay,
            offset_ms: peer.offset,
            jitter_ms: peer.jitter,
        }
    }
}

/// Time-sync service status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NtpStatus {
    /// The ntp service is active.
    pub running: bool,
    /// A system peer has been selected and heard from.
    pub synced: bool,
    /// When the clock was last synchronized.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sync_time: Option<DateTime<Utc>>,
    /// When the server list was last changed through the daemon.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_configuration_time: Option<String>,
    #[serde(default)]
    pub peers: Vec<PeerDetails>,
}

impl From<ntp_core::ServiceStatus> for NtpStatus {
    fn from(status: ntp_core::ServiceStatus) -> Self {
        NtpStatus {
            running: status.running,
            synced: status.synced,
            last_sync_time: status.last_sync_time,
            last_configuration_time: status.last_configuration_time,
            peers: status.peers.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<NtpStatus> for ntp_core::ServiceStatus {
    fn from(status: NtpStatus) -> Self {
        ntp_core::ServiceStatus {
            running: status.running,
            synced: status.synced,
            last_sync_time: status.last_sync_time,
            last_configuration_time: status.last_configuration_time,
            peers: status.peers.into_iter().map(Into::into).collect(),
        }
    }
}

// ============================================================================
// Protocol types
// ============================================================================

/// Request sent from client to daemon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum DaemonRequest {
    /// Ping to check if daemon is alive.
    Ping,
    /// Read the configured server list.
    GetNtpServer,
    /// Replace the configured server list and resynchronize.
    SetNtpServer { servers: Vec<String> },
    /// Read the service status.
    GetStatus,
}

/// Response sent from daemon to client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum DaemonResponse {
    /// Pong response.
    Pong,
    /// Configured server list.
    Servers { servers: Vec<String> },
    /// The new server list was written and the clock resynchronized.
    Applied,
    /// Service status.
    Status(NtpStatus),
    /// Error response.
    Error { message: String },
}

// ============================================================================
// Message framing
// ============================================================================

/// IPC message framing.
///
/// Messages are framed as:
/// - 4 bytes: message length (big-endian u32)
/// - N bytes: JSON-encoded message
pub mod framing {
    use std::io::{self, Read, Write};

    use serde::de::DeserializeOwned;
    use serde::Serialize;

    /// Maximum message size (1MB); larger frames are rejected before allocation.
    pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

    /// Write a serializable message to the given writer.
    pub fn write_message<W: Write, T: Serialize>(writer: &mut W, message: &T) -> io::Result<()> {
        let json = serde_json::to_vec(message)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("serialize error: {e}")))?;
        if json.len() > MAX_MESSAGE_SIZE {
            return Err(too_large(json.len()));
        }
        let len = u32::try_from(json.len()).map_err(|_| too_large(json.len()))?;
        writer.write_all(&len.to_be_bytes())?;
        writer.write_all(&json)?;
        writer.flush()
    }

    /// Read a deserializable message from the given reader.
    pub fn read_message<R: Read, T: DeserializeOwned>(reader: &mut R) -> io::Result<T> {
        let mut len_buf = [0u8; 4];
        reader.read_exact(&mut len_buf)?;
        let len = u32::from_be_bytes(len_buf) as usize;

        if len > MAX_MESSAGE_SIZE {
            return Err(too_large(len));
        }

        let mut buf = vec![0u8; len];
        reader.read_exact(&mut buf)?;

        serde_json::from_slice(&buf)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("deserialize error: {e}")))
    }

    fn too_large(len: usize) -> io::Error {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("message too large: {len} bytes (max {MAX_MESSAGE_SIZE})"),
        )
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
