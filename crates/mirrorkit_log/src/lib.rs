//! `mirrorkit_log` v1:
//! Event log for the mirror engine.
//!
//! Installs a global tracing subscriber with two sinks: an append-only log
//! file (`<timestamp> <LEVEL>: <message>`) and a console echo of the raw
//! message. Write failures are dropped by the non-blocking appender so a
//! broken log never fails the operation being logged.
//!
//! - `format` : event line layout for both sinks

pub mod format;

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*};

pub use format::{C_FIELD_CRITICAL, EnumLineStyle, FormatEventLine};

/// Default log file name, relative to the working directory.
pub const C_LOG_FILE_DEFAULT: &str = "sync.log";

/// Severity of one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EnumLogLevel {
    /// Diagnostic detail.
    Debug,
    /// Normal progress.
    Info,
    /// Degraded but continuing.
    Warning,
    /// An operation failed.
    Error,
    /// A whole pass failed.
    Critical,
}

/// Record one leveled event in every installed sink.
pub fn log_event(level: EnumLogLevel, message: &str) {
    match level {
        EnumLogLevel::Debug => tracing::debug!("{message}"),
        EnumLogLevel::Info => tracing::info!("{message}"),
        EnumLogLevel::Warning => tracing::warn!("{message}"),
        EnumLogLevel::Error => tracing::error!("{message}"),
        EnumLogLevel::Critical => tracing::error!(critical = true, "{message}"),
    }
}

/// Errors that may occur while initializing logging.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    /// Log path has no file name component.
    #[error("Log path has no file name: {}", .0.display())]
    InvalidPath(PathBuf),
    /// Failed to create the parent directory of the log file.
    #[error("Failed to prepare log directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to create or open the log file.
    #[error("Failed to create log file at {}: {source}", path.display())]
    CreateLogFile {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to set the global tracing subscriber.
    #[error("Failed to install global tracing subscriber: {0}")]
    SetGlobal(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Keeps the file writer alive; dropping it flushes pending lines.
#[must_use = "dropping the guard stops the log file writer"]
pub struct EventLogGuard {
    path: PathBuf,
    _guard: WorkerGuard,
}

impl EventLogGuard {
    /// Log file this guard writes to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Install console + file logging. Lines are appended to `path_log_file`.
///
/// Failures are returned so callers can fall back to [`init_console_log`].
pub fn init_event_log(path_log_file: &Path) -> Result<EventLogGuard, LoggingError> {
    let file_name = path_log_file
        .file_name()
        .ok_or_else(|| LoggingError::InvalidPath(path_log_file.to_path_buf()))?
        .to_owned();
    let path_dir = match path_log_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&path_dir).map_err(|source| LoggingError::CreateDir {
        path: path_dir.clone(),
        source,
    })?;
    ensure_file_exists(path_log_file)?;

    let file_appender = rolling::never(&path_dir, file_name);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_ansi(false)
        .event_format(FormatEventLine::timestamped())
        .with_writer(file_writer);
    let subscriber = Registry::default()
        .with(build_env_filter())
        .with(console_layer())
        .with(file_layer);
    tracing::subscriber::set_global_default(subscriber)?;

    Ok(EventLogGuard {
        path: path_log_file.to_path_buf(),
        _guard: guard,
    })
}

/// Install the console sink only.
pub fn init_console_log() -> Result<(), LoggingError> {
    let subscriber = Registry::default()
        .with(build_env_filter())
        .with(console_layer());
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn console_layer<S>() -> impl tracing_subscriber::Layer<S>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fmt::layer()
        .event_format(FormatEventLine::message_only())
        .with_writer(std::io::stdout)
}

fn ensure_file_exists(path: &Path) -> Result<(), LoggingError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map(|_| ())
        .map_err(|source| LoggingError::CreateLogFile {
            path: path.to_path_buf(),
            source,
        })
}

fn build_env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::{EnumLogLevel, LoggingError, ensure_file_exists, init_event_log, log_event};

    #[test]
    fn ensure_file_exists_keeps_existing_content() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("sync.log");
        fs::write(&path, "earlier line\n").expect("seed");

        ensure_file_exists(&path).expect("open append");
        assert_eq!(fs::read_to_string(&path).expect("read"), "earlier line\n");
    }

    #[test]
    fn init_rejects_path_without_file_name() {
        let err = init_event_log(std::path::Path::new("/")).err().expect("must fail");
        assert!(matches!(err, LoggingError::InvalidPath(_)));
    }

    // The only test in this binary that installs the global subscriber.
    #[test]
    fn init_event_log_appends_formatted_lines() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("sync.log");

        let guard = init_event_log(&path).expect("init logging");
        assert_eq!(guard.path(), path.as_path());
        log_event(EnumLogLevel::Info, "Sync starts..");
        log_event(EnumLogLevel::Critical, "Sync pass failed");
        drop(guard);

        let txt = fs::read_to_string(&path).expect("read log");
        let l_lines = txt.lines().collect::<Vec<_>>();
        assert_eq!(l_lines.len(), 2);
        assert!(l_lines[0].ends_with(" INFO: Sync starts.."));
        assert!(l_lines[1].ends_with(" CRITICAL: Sync pass failed"));
    }
}
