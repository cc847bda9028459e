/// Structured logging for the bird report service
///
/// Installs a `tracing` subscriber with a console layer and an optional
/// append-only file layer. Events carry a `source` field naming the
/// collaborator that produced them, and failures from the fetcher and the
/// cache are classified before they are logged.

use std::fmt;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt as tfmt;
use tracing_subscriber::{EnvFilter, Layer};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::model::ReportError;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    #[serde(alias = "warn")]
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warning => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

// ---------------------------------------------------------------------------
// Data Source Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Ebird,
    Cache,
    Report,
    Plot,
    System,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Ebird => write!(f, "EBIRD"),
            DataSource::Cache => write!(f, "CACHE"),
            DataSource::Report => write!(f, "REPORT"),
            DataSource::Plot => write!(f, "PLOT"),
            DataSource::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Expected failure - e.g. a region with no notable sightings in the window
    Expected,
    /// Unexpected failure - service degradation, bad credential or API change
    Unexpected,
    /// Unknown - cannot determine if this is expected or not
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Classify an eBird fetch failure.
pub fn classify_ebird_failure(err: &ReportError) -> FailureType {
    match err {
        // 400 for a region eBird doesn't know is a caller mistake we expect
        // to see while configuring a new region.
        ReportError::Transport { status: 400, .. } => FailureType::Expected,
        ReportError::Transport { .. } | ReportError::Parse(_) => FailureType::Unexpected,
        ReportError::Request(e) if e.is_timeout() => FailureType::Unknown,
        ReportError::Request(_) => FailureType::Unexpected,
        _ => FailureType::Unknown,
    }
}

/// Classify an observation cache failure.
pub fn classify_cache_failure(err: &ReportError) -> FailureType {
    match err {
        ReportError::Cache(_) | ReportError::Parse(_) => FailureType::Unexpected,
        _ => FailureType::Unknown,
    }
}

// ---------------------------------------------------------------------------
// Subscriber setup
// ---------------------------------------------------------------------------

/// Initialize the global subscriber.
///
/// Console output goes to stderr so report output on stdout stays clean.
/// When `log_file` is set every event is also appended there, without ANSI
/// colour codes and always with timestamps. `RUST_LOG`, when set, overrides
/// `min_level`.
pub fn init_logger(
    min_level: LogLevel,
    log_file: Option<&Path>,
    console_timestamps: bool,
) -> Result<(), ReportError> {
    let console = if console_timestamps {
        tfmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tfmt::layer()
            .with_target(false)
            .without_time()
            .with_writer(std::io::stderr)
            .boxed()
    };

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                tfmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from(min_level).into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(console)
        .with(file_layer)
        .with(filter)
        .try_init()
        .map_err(|e| ReportError::Configuration(format!("logger already initialised: {}", e)))
}

// ---------------------------------------------------------------------------
// Structured Failure Logging
// ---------------------------------------------------------------------------

/// Log a data source failure with automatic classification.
pub fn log_failure(source: DataSource, region: &str, operation: &str, err: &ReportError) {
    let failure_type = match source {
        DataSource::Ebird => classify_ebird_failure(err),
        DataSource::Cache => classify_cache_failure(err),
        _ => FailureType::Unknown,
    };

    match failure_type {
        FailureType::Expected => tracing::debug!(
            source = %source, region, kind = %failure_type, "{} failed: {}", operation, err
        ),
        FailureType::Unexpected => tracing::error!(
            source = %source, region, kind = %failure_type, "{} failed: {}", operation, err
        ),
        FailureType::Unknown => tracing::warn!(
            source = %source, region, kind = %failure_type, "{} failed: {}", operation, err
        ),
    }
}
