//! Structured logging for the scheduler.
//!
//! Command output owns stdout and stderr, so by default planner events only
//! land in `<config dir>/logs/esched.log` as JSON lines. `--verbose` mirrors
//! them to stderr and lowers the scheduler crates to `debug`.

use std::env;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::OnceLock;

use thiserror::Error;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::config_directory;

const LOG_DIR_NAME: &str = "logs";
const LOG_FILE_NAME: &str = "esched.log";
const LOG_ENV_VAR: &str = "ESCHED_LOG";
const QUIET_DIRECTIVE: &str = "info";
const VERBOSE_DIRECTIVE: &str = "info,esched_core=debug,esched_cli=debug";

/// Where planner events are published.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoggingDestination {
    /// The log file only; terminal output stays limited to command results.
    #[default]
    FileOnly,
    /// The log file plus compact lines on stderr.
    FileAndStderr,
}

impl LoggingDestination {
    pub fn for_verbosity(verbose: bool) -> Self {
        if verbose {
            Self::FileAndStderr
        } else {
            Self::FileOnly
        }
    }

    fn mirrors_to_stderr(self) -> bool {
        matches!(self, Self::FileAndStderr)
    }

    fn default_directive(self) -> &'static str {
        if self.mirrors_to_stderr() {
            VERBOSE_DIRECTIVE
        } else {
            QUIET_DIRECTIVE
        }
    }
}

#[derive(Debug)]
struct LoggingGuards {
    _guard: WorkerGuard,
    log_path: PathBuf,
}

static LOGGING_STATE: OnceLock<LoggingGuards> = OnceLock::new();

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to prepare log directory: {0}")]
    Io(#[from] io::Error),
    #[error("invalid logging filter: {0}")]
    Filter(#[from] ParseError),
    #[error("failed to install logging subscriber: {0}")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),
}

/// Install the global subscriber and return the log file path.
///
/// The first call wins; later calls only report the path chosen then.
pub fn init_logging(
    destination: LoggingDestination,
) -> Result<Option<&'static PathBuf>, LoggingError> {
    if LOGGING_STATE.get().is_none() {
        let guards = install_logging(destination)?;
        if let Err(guards) = LOGGING_STATE.set(guards) {
            drop(guards);
        }
    }

    Ok(current_log_path())
}

pub fn current_log_path() -> Option<&'static PathBuf> {
    LOGGING_STATE.get().map(|guards| &guards.log_path)
}

pub fn log_directory() -> PathBuf {
    config_directory().join(LOG_DIR_NAME)
}

fn install_logging(destination: LoggingDestination) -> Result<LoggingGuards, LoggingError> {
    let filter = EnvFilter::try_new(filter_directive(
        env::var(LOG_ENV_VAR).ok(),
        env::var(EnvFilter::DEFAULT_ENV).ok(),
        destination,
    ))?;

    let dir = log_directory();
    fs::create_dir_all(&dir)?;
    let appender = tracing_appender::rolling::never(&dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let stderr = destination.mirrors_to_stderr().then(stderr_layer);
    tracing_subscriber::registry()
        .with(filter)
        .with(json_file_layer(writer))
        .with(stderr)
        .try_init()?;

    let log_path = dir.join(LOG_FILE_NAME);
    info!(path = %log_path.display(), ?destination, "Structured logging enabled");

    Ok(LoggingGuards {
        _guard: guard,
        log_path,
    })
}

fn json_file_layer<S>(
    writer: tracing_appender::non_blocking::NonBlocking,
) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'span> LookupSpan<'span>,
{
    tracing_subscriber::fmt::layer()
        .event_format(
            tracing_subscriber::fmt::format()
                .json()
                .with_timer(UtcTime::rfc_3339())
                .with_level(true)
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        )
        .with_writer(writer)
        .with_ansi(false)
        .boxed()
}

// Timestamps are left out; verbose runs are read live next to command output.
fn stderr_layer<S>() -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'span> LookupSpan<'span>,
{
    tracing_subscriber::fmt::layer()
        .compact()
        .without_time()
        .with_target(true)
        .with_writer(io::stderr)
        .with_ansi(false)
        .boxed()
}

/// `ESCHED_LOG` beats `RUST_LOG`; blank values are skipped.
fn filter_directive(
    esched_log: Option<String>,
    rust_log: Option<String>,
    destination: LoggingDestination,
) -> String {
    [esched_log, rust_log]
        .into_iter()
        .flatten()
        .map(|spec| spec.trim().to_string())
        .find(|spec| !spec.is_empty())
        .unwrap_or_else(|| destination.default_directive().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_flag_mirrors_to_stderr() {
        assert_eq!(LoggingDestination::default(), LoggingDestination::FileOnly);
        assert_eq!(
            LoggingDestination::for_verbosity(false),
            LoggingDestination::FileOnly
        );
        assert_eq!(
            LoggingDestination::for_verbosity(true),
            LoggingDestination::FileAndStderr
        );
    }

    #[test]
    fn test_filter_prefers_esched_log_over_rust_log() {
        let directive = filter_directive(
            Some("esched_core::suggest=trace".to_string()),
            Some("warn".to_string()),
            LoggingDestination::FileOnly,
        );
        assert_eq!(directive, "esched_core::suggest=trace");

        let directive = filter_directive(
            Some("  ".to_string()),
            Some("warn".to_string()),
            LoggingDestination::FileOnly,
        );
        assert_eq!(directive, "warn");
    }

    #[test]
    fn test_verbose_runs_default_to_debug_for_scheduler_crates() {
        assert_eq!(
            filter_directive(None, None, LoggingDestination::FileOnly),
            "info"
        );
        let verbose = filter_directive(None, None, LoggingDestination::FileAndStderr);
        assert!(verbose.contains("esched_core=debug"));
        assert!(EnvFilter::try_new(verbose).is_ok());
    }
}
