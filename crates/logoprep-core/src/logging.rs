//! Logging init: append to a log file under the XDG state dir, or stderr.
//!
//! Filter directives come from `LOGOPREP_LOG`, then `RUST_LOG`, then
//! [`DEFAULT_FILTER`]. Per-row events carry `row`, `url` and `path` fields,
//! so the log file doubles as an audit trail of a pass.

use anyhow::{anyhow, Result};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Environment variable checked before `RUST_LOG`.
pub const LOG_ENV: &str = "LOGOPREP_LOG";

const DEFAULT_FILTER: &str = "info,logoprep=debug,logoprep_core=debug";

const LOG_FILE: &str = "logoprep.log";

/// `~/.local/state/logoprep/logoprep.log`; the directory is created if missing.
pub fn log_file_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("logoprep")?;
    Ok(xdg_dirs.place_state_file(LOG_FILE)?)
}

/// First non-empty directive string of `primary`, `fallback`, default.
fn directives(primary: Option<String>, fallback: Option<String>) -> String {
    [primary, fallback]
        .into_iter()
        .flatten()
        .find(|d| !d.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_FILTER.to_string())
}

fn env_filter() -> EnvFilter {
    let wanted = directives(std::env::var(LOG_ENV).ok(), std::env::var("RUST_LOG").ok());
    EnvFilter::try_new(&wanted).unwrap_or_else(|e| {
        eprintln!("logoprep: ignoring bad log filter {wanted:?}: {e}");
        EnvFilter::new(DEFAULT_FILTER)
    })
}

/// Installs the global subscriber writing to [`log_file_path`] and returns that path.
/// Errs when the state dir is unwritable so the caller can fall back to stderr.
pub fn init_logging() -> Result<PathBuf> {
    let path = log_file_path()?;
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow!("logging already initialized: {e}"))?;

    tracing::info!(path = %path.display(), "logoprep logging initialized");
    Ok(path)
}

/// Stderr-only logging for when [`init_logging`] fails. A second call is a no-op.
pub fn init_logging_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}
