// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Request handling and accept loop.

use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::os::unix::net::UnixStream;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use ntp_core::{configurator::validate_servers, ConfigReader, StatusReader};
use ntp_ipc::{framing, DaemonRequest, DaemonResponse};

use crate::worker::ConfigWorker;

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;

/// Read and write timeout applied to every connection.
const IO_TIMEOUT: Duration = Duration::from_secs(5);

/// A client connection.
pub trait Connection: Read + Write + Send + 'static {
    fn set_timeouts(&self, timeout: Duration) -> io::Result<()>;
}

impl Connection for UnixStream {
    fn set_timeouts(&self, timeout: Duration) -> io::Result<()> {
        self.set_read_timeout(Some(timeout))?;
        self.set_write_timeout(Some(timeout))
    }
}

impl Connection for TcpStream {
    fn set_timeouts(&self, timeout: Duration) -> io::Result<()> {
        self.set_read_timeout(Some(timeout))?;
        self.set_write_timeout(Some(timeout))
    }
}

pub struct Server {
    reader: Arc<dyn ConfigReader>,
    status: Arc<dyn StatusReader>,
    worker: ConfigWorker,
}

impl Server {
    pub fn new(reader: Arc<dyn ConfigReader>, status: Arc<dyn StatusReader>, worker: ConfigWorker) -> Self {
        Server { reader, status, worker }
    }

    pub fn handle_request(&self, request: DaemonRequest) -> DaemonResponse {
        match request {
            DaemonRequest::Ping => DaemonResponse::Pong,
            DaemonRequest::GetNtpServer => match self.reader.current_servers() {
                Ok(servers) => DaemonResponse::Servers { servers },
                Err(e) => error_response("cannot read ntp servers", e),
            },
            DaemonRequest::SetNtpServer { servers } => self.set_servers(servers),
            DaemonRequest::GetStatus => match self.status.status() {
                Ok(status) => DaemonResponse::Status(status.into()),
                Err(e) => error_response("cannot read ntp status", e),
            },
        }
    }

    fn set_servers(&self, servers: Vec<String>) -> DaemonResponse {
        if let Err(e) = validate_servers(&servers) {
            return DaemonResponse::Error { message: e.to_string() };
        }
        match self.worker.submit(servers) {
            Ok(()) => DaemonResponse::Applied,
            Err(e) => error_response("cannot set ntp servers", e),
        }
    }

    /// Reads one request from `stream` and writes the response.
    pub fn handle_connection<S: Read + Write>(&self, stream: &mut S) {
        let request = match framing::read_message::<_, DaemonRequest>(stream) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!("failed to read request: {e}");
                return;
            }
        };
        let response = self.handle_request(request);
        if let Err(e) = framing::write_message(stream, &response) {
            tracing::warn!("failed to write response: {e}");
        }
    }

    /// Accepts connections forever, one thread per connection.
    pub fn serve<C: Connection>(self: &Arc<Self>, incoming: impl Iterator<Item = io::Result<C>>) {
        for stream in incoming {
            let mut stream = match stream {
                Ok(stream) => stream,
                Err(e) => {
                    tracing::warn!("failed to accept connection: {e}");
                    continue;
                }
            };
            if let Err(e) = stream.set_timeouts(IO_TIMEOUT) {
                tracing::warn!("failed to set connection timeouts: {e}");
            }

            let server = Arc::clone(self);
            let spawned = thread::Builder::new()
                .name("connection".to_string())
                .spawn(move || server.handle_connection(&mut stream));
            if let Err(e) = spawned {
                tracing::error!("failed to spawn connection thread: {e}");
            }
        }
    }
}

fn error_response(context: &str, e: impl std::fmt::Display) -> DaemonResponse {
    tracing::error!("{context}: {e}");
    DaemonResponse::Error { message: format!("{context}: {e}") }
}
