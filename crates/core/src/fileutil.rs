// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Higher-level file helpers built on a [`FileSystem`].

use std::io::{self, Read, Write};
use std::path::Path;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::fs::FileSystem;

#[cfg(test)]
#[path = "fileutil_tests.rs"]
mod tests;

/// File helpers shared by every migration's precondition and mutation steps.
pub trait FileUtil: Send + Sync {
    /// Copies `source` to `target`, creating the target's parent directory.
    fn copy(&self, source: &Path, target: &Path) -> Result<()>;

    /// Replaces the content of `path` (creating it if needed).
    fn create_or_update(&self, path: &Path, content: &[u8]) -> Result<()>;

    /// True if a plain file exists at `path`.
    ///
    /// A directory at `path` counts as absent. A missing path is `Ok(false)`;
    /// any other stat failure is returned so callers can decide whether to
    /// swallow it.
    fn exists_as_file(&self, path: &Path) -> Result<bool>;
}

/// [`FileUtil`] implemented on top of any [`FileSystem`].
#[derive(Clone)]
pub struct FsFileUtil {
    fs: Arc<dyn FileSystem>,
}

impl FsFileUtil {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        FsFileUtil { fs }
    }
}

impl FileUtil for FsFileUtil {
    fn copy(&self, source: &Path, target: &Path) -> Result<()> {
        let mut src = self.fs.open(source).map_err(|e| Error::file(source, e))?;

        if let Some(parent) = target.parent() {
            self.fs.mkdir_all(parent).map_err(|e| Error::file(parent, e))?;
        }

        let mut dst = self.fs.create(target).map_err(|e| Error::file(target, e))?;
        io::copy(&mut src, &mut dst).map_err(|e| Error::file(target, e))?;
        dst.flush().map_err(|e| Error::file(target, e))?;

        tracing::debug!("copied {} to {}", source.display(), target.display());
        Ok(())
    }

    fn create_or_update(&self, path: &Path, content: &[u8]) -> Result<()> {
        let mut file = self.fs.create(path).map_err(|e| Error::file(path, e))?;
        file.write_all(content).map_err(|e| Error::file(path, e))?;
        file.flush().map_err(|e| Error::file(path, e))?;
        Ok(())
    }

    fn exists_as_file(&self, path: &Path) -> Result<bool> {
        match self.fs.stat(path) {
            Ok(stat) if stat.is_dir => {
                tracing::info!("expected a file, found directory: {}", path.display());
                Ok(false)
            }
            Ok(_) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::file(path, e)),
        }
    }
}

/// Reads the whole file at `path` as UTF-8 text.
pub fn read_to_string(fs: &dyn FileSystem, path: &Path) -> io::Result<String> {
    let mut content = String::new();
    fs.open(path)?.read_to_string(&mut content)?;
    Ok(content)
}
