// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Command-line parsing for ntpsvcd.

use std::path::PathBuf;

#[cfg(test)]
#[path = "args_tests.rs"]
mod tests;

pub const USAGE: &str = "usage: ntpsvcd [--config <path>] unix <socket-path>\n       ntpsvcd [--config <path>] tcp <host:port>";

/// Where the daemon listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Unix(PathBuf),
    Tcp(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    pub config: Option<PathBuf>,
    pub endpoint: Endpoint,
}

/// Parses the arguments after the program name. `None` means usage error.
pub fn parse(args: &[String]) -> Option<Args> {
    let mut config = None;
    let mut rest = args;

    if let [flag, path, tail @ ..] = rest {
        if flag == "--config" {
            config = Some(PathBuf::from(path));
            rest = tail;
        }
    }

    let endpoint = match rest {
        [kind, address] if kind == "unix" => Endpoint::Unix(PathBuf::from(address)),
        [kind, address] if kind == "tcp" => Endpoint::Tcp(address.clone()),
        _ => return None,
    };

    Some(Args { config, endpoint })
}
