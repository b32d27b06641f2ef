// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! ntp-core: configuration migration and control of the ntpsec service
//!
//! This crate provides the file-system and command capabilities, the startup
//! migration engine, and the configuration and status facades used by the
//! ntpsvcd daemon.

pub mod command;
pub mod configurator;
pub mod directive;
pub mod error;
pub mod fileutil;
pub mod fs;
pub mod migration;
pub mod paths;
pub mod status;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use command::{CommandRunner, ShellRunner};
pub use configurator::{ConfigReader, ConfigWriter, NtpConfigurator};
pub use error::{Error, Result};
pub use fileutil::{FileUtil, FsFileUtil};
pub use fs::{FileSystem, OsFileSystem};
pub use migration::{Migration, Outcome};
pub use paths::{Paths, ServiceCommands};
pub use status::{NtpStatusReader, PeerRecord, ServiceStatus, StatusReader};
