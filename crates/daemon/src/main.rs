// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! ntpsvcd - The ntp configuration daemon.
//!
//! Runs the startup migrations, then serves server-list and status requests
//! from `ntpctl` over a Unix or TCP socket.
//!
//! Usage:
//!   ntpsvcd [--config <path>] unix <socket-path>
//!   ntpsvcd [--config <path>] tcp <host:port>

use std::fs;
use std::path::Path;
use std::sync::Arc;

use ntp_core::migration;
use ntp_core::{
    CommandRunner, FileSystem, FileUtil, FsFileUtil, NtpConfigurator, NtpStatusReader, OsFileSystem,
    Paths, ShellRunner,
};

mod args;
mod config;
mod env;
mod listener;
mod server;
mod worker;

use config::Config;
use listener::Listener;
use server::Server;
use worker::ConfigWorker;

fn main() {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    let Some(args) = args::parse(&argv) else {
        eprintln!("{}", args::USAGE);
        std::process::exit(1);
    };

    let config_path = config::config_path(args.config.clone());
    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("ntpsvcd: {e}");
            std::process::exit(1);
        }
    };

    setup_logging(config.log_file.as_deref());
    tracing::info!("ntpsvcd {} starting, config={}", env!("CARGO_PKG_VERSION"), config_path.display());

    // Held for the lifetime of the process.
    let _lock_file = match acquire_lock(&config.lock_file) {
        Ok(f) => f,
        Err(e) => {
            tracing::error!("failed to acquire lock {}: {}", config.lock_file.display(), e);
            std::process::exit(1);
        }
    };

    let fs: Arc<dyn FileSystem> = Arc::new(OsFileSystem);
    let files: Arc<dyn FileUtil> = Arc::new(FsFileUtil::new(Arc::clone(&fs)));
    let runner: Arc<dyn CommandRunner> = Arc::new(ShellRunner::default());
    let paths = Paths::default();

    let migrations = migration::startup_migrations(
        Arc::clone(&fs),
        Arc::clone(&files),
        Arc::clone(&runner),
        &paths,
        &config.service,
    );
    migration::run_all(&migrations);

    let configurator = Arc::new(NtpConfigurator::new(
        Arc::clone(&fs),
        files,
        Arc::clone(&runner),
        paths.clone(),
        config.service.clone(),
    ));
    let status = Arc::new(NtpStatusReader::new(fs, runner, paths, config.service.clone()));

    let worker = match ConfigWorker::spawn(configurator.clone()) {
        Ok(worker) => worker,
        Err(e) => {
            tracing::error!("failed to start config writer: {}", e);
            std::process::exit(1);
        }
    };
    let server = Arc::new(Server::new(configurator, status, worker));

    let listener = match listener::bind(&args.endpoint, &config.socket) {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("failed to bind {:?}: {}", args.endpoint, e);
            std::process::exit(1);
        }
    };

    tracing::info!("listening on {:?}", args.endpoint);
    match listener {
        Listener::Unix(l) => server.serve(l.incoming()),
        Listener::Tcp(l) => server.serve(l.incoming()),
    }
}

fn setup_logging(log_file: Option<&Path>) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env(env::names::RUST_LOG).unwrap_or_else(|_| EnvFilter::new("info"));

    let file = log_file.and_then(|path| {
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| eprintln!("ntpsvcd: cannot open log file {}: {e}", path.display()))
            .ok()
    });

    match file {
        Some(file) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(file)
            .with_ansi(false)
            .init(),
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
    }
}

fn acquire_lock(lock_path: &Path) -> std::io::Result<fs::File> {
    use fs2::FileExt;

    if let Some(parent) = lock_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(lock_path)?;
    file.try_lock_exclusive()
        .map_err(|_| std::io::Error::other("another ntpsvcd instance is already running"))?;
    Ok(file)
}
