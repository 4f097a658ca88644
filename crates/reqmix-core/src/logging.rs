//! Subscriber setup for applications embedding reqmix.
//!
//! The crates only emit `tracing` events and never install a subscriber on
//! their own. The embedding application calls one of the `init_*` functions
//! once at startup; [`init_logging_or_stderr`] is the usual choice.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,reqmix=debug";
const LOG_FILE: &str = "reqmix.log";

/// Where log output ended up after [`init_logging_or_stderr`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    File(PathBuf),
    Stderr,
}

/// `RUST_LOG` if set and valid, otherwise `info,reqmix=debug`.
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// `~/.local/state/reqmix/reqmix.log`.
pub fn log_file_path() -> Result<PathBuf> {
    let dirs = xdg::BaseDirectories::with_prefix("reqmix")?;
    Ok(dirs.get_state_home().join(LOG_FILE))
}

fn open_append(path: &Path) -> Result<File> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("creating log directory {}", dir.display()))?;
    }
    fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))
}

fn install<W>(writer: W) -> Result<()>
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install subscriber: {}", e))
}

/// Log to [`log_file_path`], appending.
///
/// Meant to be called once by the embedding application at startup. Errors
/// (state dir unwritable, a subscriber already installed) are returned so the
/// caller can fall back to [`init_logging_stderr`].
pub fn init_logging() -> Result<()> {
    init_logging_at(&log_file_path()?)
}

/// Like [`init_logging`] with an explicit log file.
pub fn init_logging_at(path: &Path) -> Result<()> {
    let file = open_append(path)?;
    install(Mutex::new(file))?;
    tracing::info!(path = %path.display(), "reqmix logging initialized");
    Ok(())
}

/// Log to stderr. A subscriber that is already installed is left in place.
pub fn init_logging_stderr() {
    let _ = install(std::io::stderr);
}

/// File logging when the state dir is usable, stderr otherwise.
pub fn init_logging_or_stderr() -> LogTarget {
    let attempt = log_file_path().and_then(|path| init_logging_at(&path).map(|()| path));
    match attempt {
        Ok(path) => LogTarget::File(path),
        Err(e) => {
            init_logging_stderr();
            tracing::warn!(error = %e, "file logging unavailable, logging to stderr");
            LogTarget::Stderr
        }
    }
}
