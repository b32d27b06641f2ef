// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! IPC client for communicating with the ntpsvcd daemon.
//!
//! Each connection carries exactly one request and one response.

use std::fmt;
use std::io::{Read, Write};
use std::net::TcpStream;
use std::os::unix::net::UnixStream;
use std::path::PathBuf;
use std::time::Duration;

use ntp_ipc::{framing, DaemonRequest, DaemonResponse, NtpStatus};

use crate::error::{Error, Result};

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;

/// Timeout for sending a request and for quick replies.
const TIMEOUT_SECS: u64 = 5;
/// Read timeout while the daemon rewrites the config and resynchronizes.
const APPLY_TIMEOUT_SECS: u64 = 90;

/// Default daemon socket.
pub const DEFAULT_SOCKET: &str = "/tmp/devicemodel/ntp.socket";

/// Where the daemon listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Unix(PathBuf),
    Tcp(String),
}

impl Default for Endpoint {
    fn default() -> Self {
        Endpoint::Unix(PathBuf::from(DEFAULT_SOCKET))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Unix(path) => write!(f, "unix:{}", path.display()),
            Endpoint::Tcp(address) => write!(f, "tcp:{address}"),
        }
    }
}

trait Stream: Read + Write {
    fn set_read_timeout(&self, timeout: Duration) -> std::io::Result<()>;
}

impl Stream for UnixStream {
    fn set_read_timeout(&self, timeout: Duration) -> std::io::Result<()> {
        UnixStream::set_read_timeout(self, Some(timeout))
    }
}

impl Stream for TcpStream {
    fn set_read_timeout(&self, timeout: Duration) -> std::io::Result<()> {
        TcpStream::set_read_timeout(self, Some(timeout))
    }
}

/// A client connection to the daemon.
pub struct DaemonClient {
    stream: Box<dyn Stream>,
}

impl DaemonClient {
    /// Connect to the daemon at `endpoint`.
    pub fn connect(endpoint: &Endpoint) -> Result<Self> {
        let timeout = Some(Duration::from_secs(TIMEOUT_SECS));
        let connect_error = |source| Error::Connect { endpoint: endpoint.to_string(), source };

        let stream: Box<dyn Stream> = match endpoint {
            Endpoint::Unix(path) => {
                let stream = UnixStream::connect(path).map_err(connect_error)?;
                stream.set_write_timeout(timeout)?;
                Box::new(stream)
            }
            Endpoint::Tcp(address) => {
                let stream = TcpStream::connect(address).map_err(connect_error)?;
                stream.set_write_timeout(timeout)?;
                Box::new(stream)
            }
        };
        stream.set_read_timeout(Duration::from_secs(TIMEOUT_SECS))?;

        Ok(DaemonClient { stream })
    }

    /// Send a request and receive a response.
    fn request(mut self, request: DaemonRequest) -> Result<DaemonResponse> {
        framing::write_message(&mut self.stream, &request)?;
        match framing::read_message(&mut self.stream)? {
            DaemonResponse::Error { message } => Err(Error::Daemon(message)),
            response => Ok(response),
        }
    }

    /// Check that the daemon answers.
    pub fn ping(self) -> Result<()> {
        match self.request(DaemonRequest::Ping)? {
            DaemonResponse::Pong => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    /// The configured ntp servers.
    pub fn get_servers(self) -> Result<Vec<String>> {
        match self.request(DaemonRequest::GetNtpServer)? {
            DaemonResponse::Servers { servers } => Ok(servers),
            other => Err(unexpected(other)),
        }
    }

    /// Replace the configured ntp servers; waits for the resync to finish.
    pub fn set_servers(self, servers: Vec<String>) -> Result<()> {
        self.stream.set_read_timeout(Duration::from_secs(APPLY_TIMEOUT_SECS))?;
        match self.request(DaemonRequest::SetNtpServer { servers })? {
            DaemonResponse::Applied => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    /// The ntp service status.
    pub fn status(self) -> Result<NtpStatus> {
        match self.request(DaemonRequest::GetStatus)? {
            DaemonResponse::Status(status) => Ok(status),
            other => Err(unexpected(other)),
        }
    }
}

fn unexpected(response: DaemonResponse) -> Error {
    Error::UnexpectedResponse(format!("{response:?}"))
}
