//! Run logging.
//!
//! Every run writes `<output>/logs/mriqc-nidm-<timestamp>.log` and echoes the
//! same events to stderr. The subscriber is scoped to the returned guard.

use anyhow::{Context, Result};
use chrono::Local;
use mriqc_nidm_core::config::AppConfig;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::dispatcher::DefaultGuard;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Keeps the run subscriber installed until dropped.
pub struct LogGuard {
    path: PathBuf,
    _guard: DefaultGuard,
}

impl LogGuard {
    /// Path of the run-log file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Build the console + file subscriber for a run.
///
/// `RUST_LOG` overrides the level chosen by `verbose` when set.
pub fn init(logs_dir: &Path, verbose: bool) -> Result<LogGuard> {
    fs::create_dir_all(logs_dir)
        .with_context(|| format!("failed to create log directory {}", logs_dir.display()))?;

    let timestamp = Local::now().format(AppConfig::LOG_TIMESTAMP_FORMAT);
    let path = logs_dir.join(format!("{}-{}.log", AppConfig::LOG_FILE_PREFIX, timestamp));
    let file = File::create(&path)
        .with_context(|| format!("failed to create log file {}", path.display()))?;

    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let console = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact();
    let log_file = fmt::layer()
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(file));

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(log_file);

    Ok(LogGuard {
        path,
        _guard: tracing::subscriber::set_default(subscriber),
    })
}
