// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory test doubles for the file-system and command capabilities.
//!
//! `MemoryFs` records every call and can be told to fail any operation on a
//! given path; `ScriptedRunner` records commands and returns scripted output
//! or failures. Both are cheap to clone and share their state between clones,
//! so a test can keep a handle while the engine owns another.

use std::collections::{BTreeMap, HashMap};
use std::io::{self, Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::command::CommandRunner;
use crate::error::{Error, Result};
use crate::fs::{FileStat, FileSystem, Handle};

/// Operation kinds that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsOp {
    Open,
    Create,
    OpenAppend,
    Remove,
    Rename,
    MkdirAll,
    Stat,
    /// Writes through a handle opened by `create` or `open_append`.
    Write,
}

/// A recorded call against [`MemoryFs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsCall {
    Open(PathBuf),
    Create(PathBuf),
    OpenAppend(PathBuf),
    Remove(PathBuf),
    Rename(PathBuf, PathBuf),
    MkdirAll(PathBuf),
    Stat(PathBuf),
}

#[derive(Debug, Clone)]
enum Node {
    File(Vec<u8>),
    Dir,
}

#[derive(Debug, Default)]
struct FsState {
    nodes: BTreeMap<PathBuf, Node>,
    calls: Vec<FsCall>,
    failures: Vec<(FsOp, PathBuf, io::ErrorKind)>,
}

impl FsState {
    fn check(&self, op: FsOp, path: &Path) -> io::Result<()> {
        match self.failures.iter().find(|(o, p, _)| *o == op && p == path) {
            Some((_, _, kind)) => {
                Err(io::Error::new(*kind, format!("injected {op:?} failure on {}", path.display())))
            }
            None => Ok(()),
        }
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(self.nodes.get(path), Some(Node::Dir))
            || self.nodes.keys().any(|k| k != path && k.starts_with(path))
    }
}

/// In-memory [`FileSystem`].
#[derive(Debug, Clone, Default)]
pub struct MemoryFs {
    state: Arc<Mutex<FsState>>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`MemoryFs::add_file`].
    pub fn with_file(self, path: impl AsRef<Path>, content: impl AsRef<[u8]>) -> Self {
        self.add_file(path, content);
        self
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl AsRef<[u8]>) {
        self.lock().nodes.insert(path.as_ref().to_path_buf(), Node::File(content.as_ref().to_vec()));
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        self.lock().nodes.insert(path.as_ref().to_path_buf(), Node::Dir);
    }

    /// Makes every future `op` on `path` fail with `kind`.
    pub fn fail(&self, op: FsOp, path: impl AsRef<Path>, kind: io::ErrorKind) {
        self.lock().failures.push((op, path.as_ref().to_path_buf(), kind));
    }

    /// Content of the file at `path`, if one exists.
    pub fn read(&self, path: impl AsRef<Path>) -> Option<String> {
        self.read_bytes(path).map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn read_bytes(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        match self.lock().nodes.get(path.as_ref()) {
            Some(Node::File(bytes)) => Some(bytes.clone()),
            _ => None,
        }
    }

    pub fn is_file(&self, path: impl AsRef<Path>) -> bool {
        matches!(self.lock().nodes.get(path.as_ref()), Some(Node::File(_)))
    }

    pub fn calls(&self) -> Vec<FsCall> {
        self.lock().calls.clone()
    }

    /// Calls that change state (everything except `Open` and `Stat`).
    pub fn mutations(&self) -> Vec<FsCall> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c, FsCall::Open(_) | FsCall::Stat(_)))
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, FsState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn writer(&self, path: &Path) -> Handle {
        Box::new(MemoryWriter { state: Arc::clone(&self.state), path: path.to_path_buf() })
    }
}

impl FileSystem for MemoryFs {
    fn open(&self, path: &Path) -> io::Result<Handle> {
        let mut state = self.lock();
        state.calls.push(FsCall::Open(path.to_path_buf()));
        state.check(FsOp::Open, path)?;
        match state.nodes.get(path) {
            Some(Node::File(bytes)) => Ok(Box::new(Cursor::new(bytes.clone()))),
            Some(Node::Dir) => Err(io::Error::other(format!("is a directory: {}", path.display()))),
            None => Err(not_found(path)),
        }
    }

    fn create(&self, path: &Path) -> io::Result<Handle> {
        {
            let mut state = self.lock();
            state.calls.push(FsCall::Create(path.to_path_buf()));
            state.check(FsOp::Create, path)?;
            if let Some(Node::Dir) = state.nodes.get(path) {
                return Err(io::Error::other(format!("is a directory: {}", path.display())));
            }
            state.nodes.insert(path.to_path_buf(), Node::File(Vec::new()));
        }
        Ok(self.writer(path))
    }

    fn open_append(&self, path: &Path) -> io::Result<Handle> {
        {
            let mut state = self.lock();
            state.calls.push(FsCall::OpenAppend(path.to_path_buf()));
            state.check(FsOp::OpenAppend, path)?;
            if !matches!(state.nodes.get(path), Some(Node::File(_))) {
                return Err(not_found(path));
            }
        }
        Ok(self.writer(path))
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        let mut state = self.lock();
        state.calls.push(FsCall::Remove(path.to_path_buf()));
        state.check(FsOp::Remove, path)?;
        match state.nodes.remove(path) {
            Some(_) => Ok(()),
            None => Err(not_found(path)),
        }
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        let mut state = self.lock();
        state.calls.push(FsCall::Rename(from.to_path_buf(), to.to_path_buf()));
        state.check(FsOp::Rename, from)?;
        let node = state.nodes.remove(from).ok_or_else(|| not_found(from))?;
        state.nodes.insert(to.to_path_buf(), node);
        Ok(())
    }

    fn mkdir_all(&self, path: &Path) -> io::Result<()> {
        let mut state = self.lock();
        state.calls.push(FsCall::MkdirAll(path.to_path_buf()));
        state.check(FsOp::MkdirAll, path)?;
        if let Some(Node::File(_)) = state.nodes.get(path) {
            return Err(io::Error::new(io::ErrorKind::AlreadyExists, "file exists"));
        }
        state.nodes.insert(path.to_path_buf(), Node::Dir);
        Ok(())
    }

    fn stat(&self, path: &Path) -> io::Result<FileStat> {
        let mut state = self.lock();
        state.calls.push(FsCall::Stat(path.to_path_buf()));
        state.check(FsOp::Stat, path)?;
        if state.is_dir(path) {
            Ok(FileStat { is_dir: true })
        } else if state.nodes.contains_key(path) {
            Ok(FileStat { is_dir: false })
        } else {
            Err(not_found(path))
        }
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("no such file: {}", path.display()))
}

/// Write handle that lands bytes in the shared state immediately.
struct MemoryWriter {
    state: Arc<Mutex<FsState>>,
    path: PathBuf,
}

impl Read for MemoryWriter {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Ok(0)
    }
}

impl Write for MemoryWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.check(FsOp::Write, &self.path)?;
        match state.nodes.get_mut(&self.path) {
            Some(Node::File(bytes)) => {
                bytes.extend_from_slice(buf);
                Ok(buf.len())
            }
            _ => Err(not_found(&self.path)),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[derive(Debug, Default)]
struct RunnerState {
    commands: Vec<String>,
    outputs: HashMap<String, String>,
    failures: HashMap<String, Option<i32>>,
}

/// [`CommandRunner`] that records commands instead of executing them.
///
/// Unscripted commands succeed with empty output.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRunner {
    state: Arc<Mutex<RunnerState>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `command` succeed with `output`.
    pub fn respond(&self, command: &str, output: &str) {
        self.lock().outputs.insert(command.to_string(), output.to_string());
    }

    /// Makes `command` exit with `code`.
    pub fn fail(&self, command: &str, code: i32) {
        self.lock().failures.insert(command.to_string(), Some(code));
    }

    /// Commands run so far, in order.
    pub fn commands(&self) -> Vec<String> {
        self.lock().commands.clone()
    }

    pub fn ran(&self, command: &str) -> bool {
        self.lock().commands.iter().any(|c| c == command)
    }

    fn lock(&self) -> MutexGuard<'_, RunnerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, command: &str) -> Result<String> {
        let mut state = self.lock();
        state.commands.push(command.to_string());
        if let Some(code) = state.failures.get(command) {
            return Err(Error::CommandFailed {
                command: command.to_string(),
                code: *code,
                stderr: format!("scripted failure of '{command}'"),
            });
        }
        Ok(state.outputs.get(command).cloned().unwrap_or_default())
    }
}
