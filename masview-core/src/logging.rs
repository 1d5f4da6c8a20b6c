//! Logging for masview
//!
//! Events go to a daily-rotated file under the XDG state directory
//! (`~/.local/state/masview/masview.log*`). Timeline reconstruction only
//! emits `debug`/`trace` events, so the default `info` level records just
//! CLI runs and discovery summaries.

use crate::config::{Config, LoggingConfig};
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_PREFIX: &str = "masview.log";

/// Flushes buffered log lines when dropped; hold it for the life of `main`.
pub struct LoggingGuard {
    _worker: WorkerGuard,
}

/// Install the global file subscriber.
///
/// `RUST_LOG` takes precedence over `config.level`.
pub fn init(config: &LoggingConfig) -> Result<LoggingGuard> {
    let log_dir = Config::state_dir();
    let filter = level_filter(&config.level)?;
    let appender = rolling_appender(&log_dir, config.max_files)?;
    let (writer, worker) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true),
        )
        .try_init()
        .map_err(|e| Error::Logging(e.to_string()))?;

    tracing::info!(log_dir = %log_dir.display(), level = %config.level, "Logging initialized");
    Ok(LoggingGuard { _worker: worker })
}

/// Filter from `RUST_LOG`, falling back to the configured level.
fn level_filter(level: &str) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(level)
        .map_err(|e| Error::Logging(format!("invalid log level {:?}: {}", level, e)))
}

fn rolling_appender(log_dir: &Path, max_files: usize) -> Result<RollingFileAppender> {
    std::fs::create_dir_all(log_dir)?;
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .max_log_files(max_files)
        .build(log_dir)
        .map_err(|e| Error::Logging(e.to_string()))
}

/// Test subscriber writing through the libtest capture.
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Base path of the current log file
pub fn log_file_path() -> PathBuf {
    Config::log_path()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_log_file_path() {
        assert!(log_file_path().ends_with(LOG_FILE_PREFIX));
    }

    #[test]
    fn test_level_filter_accepts_directives() {
        assert!(level_filter("debug").is_ok());
        assert!(level_filter("masview_core::timeline=trace,info").is_ok());
    }

    #[test]
    fn test_rolling_appender_creates_log_dir() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("state/masview");

        rolling_appender(&dir, 3).unwrap();
        assert!(dir.is_dir());
    }
}
