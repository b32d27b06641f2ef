// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Narrow file-system capability used by the migration engine.
//!
//! Every operation maps one-to-one onto a `std::fs` call so the engine can be
//! exercised against an in-memory implementation and failures can be injected
//! per path.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::Path;

#[cfg(test)]
#[path = "fs_tests.rs"]
mod tests;

/// A readable and writable byte stream returned by [`FileSystem`].
pub trait FileHandle: Read + Write + Send {}

impl<T: Read + Write + Send> FileHandle for T {}

/// Boxed handle type returned by every opening operation.
pub type Handle = Box<dyn FileHandle>;

/// The subset of file metadata the engine cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub is_dir: bool,
}

/// File-system operations, one-to-one with `std::fs`.
pub trait FileSystem: Send + Sync {
    /// Opens an existing file for reading.
    fn open(&self, path: &Path) -> io::Result<Handle>;

    /// Creates or truncates a file for writing.
    fn create(&self, path: &Path) -> io::Result<Handle>;

    /// Opens an existing file for appending. Does not create it.
    fn open_append(&self, path: &Path) -> io::Result<Handle>;

    fn remove(&self, path: &Path) -> io::Result<()>;

    /// Renames `from` to `to`, replacing `to` if it exists.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Creates a directory and all missing parents.
    fn mkdir_all(&self, path: &Path) -> io::Result<()>;

    fn stat(&self, path: &Path) -> io::Result<FileStat>;
}

/// [`FileSystem`] backed by the real disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsFileSystem;

/// Permissions for directories created by the engine.
const DIR_MODE: u32 = 0o755;

impl FileSystem for OsFileSystem {
    fn open(&self, path: &Path) -> io::Result<Handle> {
        Ok(Box::new(File::open(path)?))
    }

    fn create(&self, path: &Path) -> io::Result<Handle> {
        Ok(Box::new(File::create(path)?))
    }

    fn open_append(&self, path: &Path) -> io::Result<Handle> {
        Ok(Box::new(OpenOptions::new().append(true).open(path)?))
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }

    fn mkdir_all(&self, path: &Path) -> io::Result<()> {
        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(DIR_MODE);
        }
        builder.create(path)
    }

    fn stat(&self, path: &Path) -> io::Result<FileStat> {
        let meta = fs::metadata(path)?;
        Ok(FileStat { is_dir: meta.is_dir() })
    }
}
