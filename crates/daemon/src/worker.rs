// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Serialized configuration writer.
//!
//! Every server-list change runs on one background thread, one at a time, so
//! concurrent requests never interleave config rewrites or service restarts.
//! Callers block until their own change has been applied.

use std::io;
use std::sync::mpsc::{self, Receiver, Sender, SyncSender};
use std::sync::Arc;
use std::thread;

use chrono::Local;
use ntp_core::ConfigWriter;
use thiserror::Error;

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("configuration writer is not running")]
    Stopped,

    #[error(transparent)]
    Write(#[from] ntp_core::Error),
}

struct Job {
    servers: Vec<String>,
    reply: Sender<ntp_core::Result<()>>,
}

/// Handle to the writer thread. Cheap to clone.
#[derive(Clone)]
pub struct ConfigWorker {
    jobs: SyncSender<Job>,
}

impl ConfigWorker {
    /// Starts the writer thread.
    pub fn spawn(writer: Arc<dyn ConfigWriter>) -> io::Result<Self> {
        let (jobs, queue) = mpsc::sync_channel(1);
        thread::Builder::new()
            .name("config-writer".to_string())
            .spawn(move || run(writer.as_ref(), queue))?;
        Ok(ConfigWorker { jobs })
    }

    /// Applies `servers` and waits for the result.
    pub fn submit(&self, servers: Vec<String>) -> Result<(), SubmitError> {
        let (reply, result) = mpsc::channel();
        self.jobs.send(Job { servers, reply }).map_err(|_| SubmitError::Stopped)?;
        result.recv().map_err(|_| SubmitError::Stopped)?.map_err(SubmitError::from)
    }
}

fn run(writer: &dyn ConfigWriter, queue: Receiver<Job>) {
    for job in queue {
        let result = apply(writer, &job.servers);
        if job.reply.send(result).is_err() {
            tracing::debug!("requester went away before the result was ready");
        }
    }
    tracing::info!("config writer stopped");
}

fn apply(writer: &dyn ConfigWriter, servers: &[String]) -> ntp_core::Result<()> {
    writer.write(servers)?;
    if let Err(e) = writer.record_configuration_time(Local::now()) {
        tracing::warn!("cannot record configuration time: {e}");
    }
    Ok(())
}
