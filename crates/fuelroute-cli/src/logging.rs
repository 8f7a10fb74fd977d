//! Logging setup for the command-line tool.
//!
//! Diagnostics always go to stderr so that stdout stays parseable when
//! `--format json` is used.
//!
//! # Environment Variables
//!
//! - `LOG_FORMAT`: `text` (default) or `json`
//! - `RUST_LOG`: Log level filter (default: `warn`, or `debug` with `--verbose`)

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines (default).
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// Accepts "json", "text" or "pretty" (alias for text). Anything else is text.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }
}

/// Configuration for the logging system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// Filter directive, from `RUST_LOG` when set (e.g. "warn", "fuelroute_lib=debug").
    pub level: String,
    /// Whether `level` came from `RUST_LOG`.
    pub level_from_env: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            level: "warn".to_string(),
            level_from_env: false,
        }
    }
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let directive = lookup("RUST_LOG").filter(|v| !v.trim().is_empty());
        Self {
            format: lookup("LOG_FORMAT")
                .map(|v| LogFormat::parse(&v))
                .unwrap_or(defaults.format),
            level_from_env: directive.is_some(),
            level: directive.unwrap_or(defaults.level),
        }
    }

    /// Raise the default level to `debug` for `--verbose`. An explicit
    /// `RUST_LOG` wins.
    pub fn verbose(mut self, verbose: bool) -> Self {
        if verbose && !self.level_from_env {
            self.level = "debug".to_string();
        }
        self
    }
}

/// Install the global subscriber. Safe to call more than once; later calls are ignored.
pub fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("warn"));
    let registry = tracing_subscriber::registry().with(filter);

    let _ = match config.format {
        LogFormat::Text => registry
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .try_init(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_current_span(false)
                    .with_span_list(false),
            )
            .try_init(),
    };
}
