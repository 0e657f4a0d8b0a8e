//! Logging configuration for Gantry
//!
//! Thin builder over `tracing-subscriber`. Defaults to JSON output on
//! STDOUT with the level taken from `RUST_LOG` when set.
//!
//! # Examples
//!
//! ```no_run
//! use gantry_core::logging::{LogConfig, LogFormat, LogLevel};
//!
//! LogConfig::new()
//!     .level(LogLevel::Debug)
//!     .format(LogFormat::Pretty)
//!     .init();
//! ```

use tracing_subscriber::EnvFilter;

/// Log level filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Output format for log messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON format (default) - structured, machine-readable
    Json,
    /// Pretty format - colored, formatted for development
    Pretty,
    /// Compact format - minimal output
    Compact,
}

/// Output destination for logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    Stdout,
    Stderr,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    pub output: LogOutput,
    /// Custom environment filter (overrides level if set)
    pub env_filter: Option<String>,
}

impl LogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set log level
    pub fn level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Set output format
    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set output destination
    pub fn output(mut self, output: LogOutput) -> Self {
        self.output = output;
        self
    }

    /// Set a custom environment filter, e.g. "gantry_core=debug,hyper=info"
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Initialize the global subscriber.
    ///
    /// Safe to call more than once; later calls are no-ops (the first
    /// subscriber wins), which keeps tests from fighting over the global.
    pub fn init(self) {
        let result = match self.output {
            LogOutput::Stdout => {
                let builder = tracing_subscriber::fmt()
                    .with_env_filter(self.build_filter())
                    .with_writer(std::io::stdout as fn() -> std::io::Stdout);
                match self.format {
                    LogFormat::Json => builder.json().try_init(),
                    LogFormat::Pretty => builder.pretty().try_init(),
                    LogFormat::Compact => builder.compact().try_init(),
                }
            }
            LogOutput::Stderr => {
                let builder = tracing_subscriber::fmt()
                    .with_env_filter(self.build_filter())
                    .with_writer(std::io::stderr as fn() -> std::io::Stderr);
                match self.format {
                    LogFormat::Json => builder.json().try_init(),
                    LogFormat::Pretty => builder.pretty().try_init(),
                    LogFormat::Compact => builder.compact().try_init(),
                }
            }
        };

        if result.is_err() {
            tracing::trace!("Global subscriber already installed, keeping it");
        }
    }

    fn build_filter(&self) -> EnvFilter {
        if let Some(filter_str) = &self.env_filter {
            EnvFilter::try_new(filter_str)
                .unwrap_or_else(|_| EnvFilter::new(self.level.as_str()))
        } else {
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(self.level.as_str()))
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Json,
            output: LogOutput::Stdout,
            env_filter: None,
        }
    }
}
