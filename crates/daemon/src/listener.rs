// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Binding the listening socket.

use std::fs;
use std::io;
use std::net::TcpListener;
use std::os::unix::fs::PermissionsExt;
use std::os::unix::net::UnixListener;
use std::path::Path;

use crate::args::Endpoint;
use crate::config::SocketConfig;

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;

pub enum Listener {
    Unix(UnixListener),
    Tcp(TcpListener),
}

pub fn bind(endpoint: &Endpoint, socket: &SocketConfig) -> io::Result<Listener> {
    match endpoint {
        Endpoint::Unix(path) => bind_unix(path, socket).map(Listener::Unix),
        Endpoint::Tcp(address) => TcpListener::bind(address).map(Listener::Tcp),
    }
}

/// Binds a Unix socket, replacing a stale one, and applies mode and ownership.
///
/// Ownership failures are logged; the socket stays usable by its creator.
pub fn bind_unix(path: &Path, socket: &SocketConfig) -> io::Result<UnixListener> {
    match fs::remove_file(path) {
        Ok(()) => tracing::debug!("removed stale socket {}", path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let listener = UnixListener::bind(path)?;
    fs::set_permissions(path, fs::Permissions::from_mode(socket.mode))?;
    if let Err(e) = set_ownership(path, &socket.owner, &socket.group) {
        tracing::warn!(
            "cannot change ownership of {} to {}:{}: {e}",
            path.display(),
            socket.owner,
            socket.group
        );
    }
    Ok(listener)
}

fn set_ownership(path: &Path, owner: &str, group: &str) -> Result<(), String> {
    use nix::unistd::{chown, Group, User};

    let uid = User::from_name(owner)
        .map_err(|e| e.to_string())?
        .ok_or_else(|| format!("no such user: {owner}"))?
        .uid;
    let gid = Group::from_name(group)
        .map_err(|e| e.to_string())?
        .ok_or_else(|| format!("no such group: {group}"))?
        .gid;
    chown(path, Some(uid), Some(gid)).map_err(|e| e.to_string())
}
