//! Logging setup for the CLI.
//!
//! Human-readable logs go to stderr so stdout stays clean for command output
//! and the MCP stdio transport. A JSON log file is written alongside when a
//! log directory can be created.

use std::path::PathBuf;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

const ENV_LOG_PATH: &str = "BUCKETEER_LOG_PATH";
const ENV_LOG_DIR: &str = "BUCKETEER_LOG_DIR";
const LOG_FILE_NAME: &str = "bucketeer.jsonl";

/// Where log files go.
#[derive(Debug, Clone, Default)]
pub struct ObservabilityConfig {
    /// Explicit log file path. Takes precedence over `log_dir`.
    pub log_path: Option<PathBuf>,
    /// Directory for a daily-rotated log file.
    pub log_dir: Option<PathBuf>,
}

impl ObservabilityConfig {
    /// Build from environment variables, falling back to `config_log_dir` and
    /// then the platform data directory.
    pub fn from_env_with_overrides(config_log_dir: Option<PathBuf>) -> Self {
        let log_path = std::env::var_os(ENV_LOG_PATH).map(PathBuf::from);
        let log_dir = std::env::var_os(ENV_LOG_DIR)
            .map(PathBuf::from)
            .or(config_log_dir)
            .or_else(|| {
                bucketeer_core::config::user_data_local_dir()
                    .map(|dir| dir.join("logs").into_std_path_buf())
            });
        Self { log_path, log_dir }
    }
}

/// Guard that flushes the file log on drop.
pub struct ObservabilityGuard {
    _file: Option<WorkerGuard>,
}

/// Build the log filter from CLI flags and the configured level.
///
/// `RUST_LOG` wins when set. Otherwise `--quiet` means errors only and each
/// `-v` raises the level one step above the configured one.
pub fn env_filter(quiet: bool, verbose: u8, config_level: &str) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => config_level,
            1 => "debug",
            _ => "trace",
        }
    };
    EnvFilter::new(level)
}

/// Install the global subscriber.
pub fn init_observability(
    config: &ObservabilityConfig,
    filter: EnvFilter,
) -> anyhow::Result<ObservabilityGuard> {
    let (file_layer, guard) = match file_writer(config) {
        Some((writer, guard)) => {
            let layer = fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(filter.clone());
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .context("a global tracing subscriber is already installed")?;

    Ok(ObservabilityGuard { _file: guard })
}

fn file_writer(
    config: &ObservabilityConfig,
) -> Option<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    if let Some(ref path) = config.log_path {
        let dir = path.parent().filter(|p| !p.as_os_str().is_empty())?;
        let file_name = path.file_name()?;
        std::fs::create_dir_all(dir).ok()?;
        let appender = tracing_appender::rolling::never(dir, file_name);
        return Some(tracing_appender::non_blocking(appender));
    }

    let dir = config.log_dir.as_ref()?;
    // Logging is best effort; an unwritable directory just disables the file.
    std::fs::create_dir_all(dir).ok()?;
    let appender = tracing_appender::rolling::daily(dir, LOG_FILE_NAME);
    Some(tracing_appender::non_blocking(appender))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_means_error() {
        // Only meaningful when RUST_LOG is unset in the test environment.
        if std::env::var_os("RUST_LOG").is_none() {
            assert_eq!(env_filter(true, 3, "info").to_string(), "error");
        }
    }

    #[test]
    fn verbose_raises_level() {
        if std::env::var_os("RUST_LOG").is_none() {
            assert_eq!(env_filter(false, 0, "warn").to_string(), "warn");
            assert_eq!(env_filter(false, 1, "warn").to_string(), "debug");
            assert_eq!(env_filter(false, 2, "warn").to_string(), "trace");
        }
    }

    #[test]
    fn config_log_dir_used_without_env() {
        if std::env::var_os(ENV_LOG_DIR).is_none() {
            let cfg = ObservabilityConfig::from_env_with_overrides(Some(PathBuf::from("/tmp/x")));
            assert_eq!(cfg.log_dir, Some(PathBuf::from("/tmp/x")));
        }
    }
}
