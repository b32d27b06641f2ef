// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! ntpctl: operator client for the ntpsvcd daemon.

use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod client;
pub mod display;
pub mod error;

pub use client::{DaemonClient, Endpoint};
pub use error::{Error, Result};

#[derive(Parser)]
#[command(name = "ntpctl", version)]
#[command(about = "Query and configure the ntp service through the ntpsvcd daemon")]
pub struct Cli {
    /// Daemon Unix socket [default: /tmp/devicemodel/ntp.socket]
    #[arg(long, global = true, value_name = "PATH", conflicts_with = "tcp")]
    pub unix: Option<PathBuf>,

    /// Daemon TCP address
    #[arg(long, global = true, value_name = "HOST:PORT")]
    pub tcp: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn endpoint(&self) -> Endpoint {
        match (&self.unix, &self.tcp) {
            (_, Some(address)) => Endpoint::Tcp(address.clone()),
            (Some(path), None) => Endpoint::Unix(path.clone()),
            (None, None) => Endpoint::default(),
        }
    }
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Show the configured ntp servers
    Get,
    /// Replace the configured ntp servers and resynchronize the clock
    Set {
        /// Server entries, e.g. "0.pool.ntp.org" or "time.example iburst"
        #[arg(required = true, value_name = "SERVER")]
        servers: Vec<String>,
    },
    /// Show ntp service status and peers
    Status {
        /// Print status as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check that the daemon is reachable
    Ping,
}

pub fn run(cli: Cli) -> Result<()> {
    let endpoint = cli.endpoint();
    let stdout = std::io::stdout();
    execute(&endpoint, cli.command, &mut stdout.lock())
}

/// Runs `command` against the daemon at `endpoint`, writing output to `out`.
pub fn execute<W: Write>(endpoint: &Endpoint, command: Command, out: &mut W) -> Result<()> {
    let client = DaemonClient::connect(endpoint)?;
    match command {
        Command::Get => {
            let servers = client.get_servers()?;
            write!(out, "{}", display::format_servers(&servers))?;
        }
        Command::Set { servers } => {
            let count = servers.len();
            client.set_servers(servers)?;
            writeln!(out, "ntp servers updated ({count})")?;
        }
        Command::Status { json } => {
            let status = client.status()?;
            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(&status)?)?;
            } else {
                write!(out, "{}", display::format_status(&status))?;
            }
        }
        Command::Ping => {
            client.ping()?;
            writeln!(out, "pong")?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
