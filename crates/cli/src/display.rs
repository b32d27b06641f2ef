// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use ntp_ipc::{NtpStatus, PeerDetails};

/// Column header matching the layout of `ntpq -pn`.
const PEER_HEADER: &str =
    "     remote           refid      st t when poll reach   delay   offset   jitter";

/// One server per line.
pub fn format_servers(servers: &[String]) -> String {
    servers.iter().map(|s| format!("{s}\n")).collect()
}

/// Human-readable status block followed by the peer table.
pub fn format_status(status: &NtpStatus) -> String {
    let mut out = String::new();

    let service = if status.running { "running" } else { "stopped" };
    out.push_str(&format!("Service:       {service}\n"));

    let synced = match (status.synced, status.last_sync_time) {
        (true, Some(at)) => format!("yes (last sync {})", at.format("%Y-%m-%d %H:%M:%S UTC")),
        (true, None) => "yes".to_string(),
        (false, _) => "no".to_string(),
    };
    out.push_str(&format!("Synchronized:  {synced}\n"));

    let configured = status.last_configuration_time.as_deref().unwrap_or("never");
    out.push_str(&format!("Configured:    {configured}\n"));

    if !status.peers.is_empty() {
        out.push('\n');
        out.push_str(PEER_HEADER);
        out.push('\n');
        for peer in &status.peers {
            out.push_str(&format_peer(peer));
            out.push('\n');
        }
    }
    out
}

pub fn format_peer(peer: &PeerDetails) -> String {
    format!(
        "{}{:<15} {:<15} {:>2} {} {:>4} {:>4} {:>5} {:>7.3} {:>8.3} {:>8.3}",
        peer.tally.unwrap_or(' '),
        peer.remote,
        peer.refid,
        peer.stratum,
        peer.peer_type,
        peer.when,
        peer.poll,
        peer.reach,
        peer.delay,
        peer.offset,
        peer.jitter,
    )
}

#[cfg(test)]
#[path = "display_tests.rs"]
mod tests;
