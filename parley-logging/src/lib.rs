//! Structured logging setup for Parley services

use std::fmt;
use std::str::FromStr;

use tracing_subscriber::{
    fmt as tracing_fmt,
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
    EnvFilter,
};

/// Output format of the log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per line (production)
    Json,
    /// Human-readable lines (development)
    Console,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "console" | "pretty" | "text" => Ok(LogFormat::Console),
            other => Err(format!("unknown log format: {}", other)),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Json => f.write_str("json"),
            LogFormat::Console => f.write_str("console"),
        }
    }
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Initialize structured logging, failing if a global subscriber is already set
///
/// This sets up:
/// - JSON formatted logs with target, file and line
/// - Environment-based log level filtering (`RUST_LOG`)
/// - Service name tagging
pub fn try_init_logging(service_name: &str, default_level: &str) -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(env_filter(default_level))
        .with(
            tracing_fmt::layer()
                .json()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_current_span(false)
                .with_span_list(false),
        )
        .try_init()?;

    tracing::info!(service = service_name, "Logging initialized");
    Ok(())
}

/// Initialize human-readable console logging, failing if a global subscriber is already set
pub fn try_init_console_logging(service_name: &str, default_level: &str) -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(env_filter(default_level))
        .with(
            tracing_fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        )
        .try_init()?;

    tracing::info!(service = service_name, "Console logging initialized");
    Ok(())
}

/// Initialize structured JSON logging for a service
///
/// A second call is a no-op: the first subscriber stays installed.
pub fn init_logging(service_name: &str, default_level: &str) {
    if let Err(e) = try_init_logging(service_name, default_level) {
        tracing::debug!(error = %e, "Logging already initialized");
    }
}

/// Initialize simple console logging (for development)
pub fn init_console_logging(service_name: &str, default_level: &str) {
    if let Err(e) = try_init_console_logging(service_name, default_level) {
        tracing::debug!(error = %e, "Logging already initialized");
    }
}

/// Initialize logging in the requested format
pub fn init_with_format(service_name: &str, default_level: &str, format: LogFormat) {
    match format {
        LogFormat::Json => init_logging(service_name, default_level),
        LogFormat::Console => init_console_logging(service_name, default_level),
    }
}
