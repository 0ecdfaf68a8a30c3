//! Logging initialization
//!
//! Console output goes to stderr through an env filter (default `info`,
//! `debug` with `-v`). When a log path is configured, every run also writes
//! `<LOG_PATH>_<YYYY-mm-dd_HH-MM-SS>.log` as plain `LEVEL message` lines.

use crate::error::{Error, Result, ResultExt};
use crate::output::FILE_TIMESTAMP_FORMAT;
use chrono::NaiveDateTime;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Per-run log file for base path `base`
pub fn log_file_path(base: &Path, started: NaiveDateTime) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(format!("_{}.log", started.format(FILE_TIMESTAMP_FORMAT)));
    PathBuf::from(name)
}

/// Install the global subscriber
///
/// The returned guard flushes the file writer on drop and must outlive the
/// run.
pub fn init_logging(
    log_path: Option<&Path>,
    verbose: bool,
    started: NaiveDateTime,
) -> Result<Option<WorkerGuard>> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let (file_layer, guard) = match log_path {
        Some(base) => {
            let path = log_file_path(base, started);
            if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            }
            let file = std::fs::File::create(&path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(file);

            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .without_time()
                .with_target(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .try_init()
        .map_err(|e| Error::config(format!("Failed to initialize logging: {e}")))?;

    Ok(guard)
}
