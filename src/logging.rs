//! Structured diagnostics for the probe
//!
//! Every entry goes to stderr so that stdout carries nothing but metric
//! lines. Entries carry a level, the emitting component, structured fields
//! and the run id shared by all loggers of one invocation.
//!
//! Default level is `WARN` (per-sample failures only); `--verbose` adds run
//! progress at `INFO`, `--debug` switches to JSON with source locations.

use crate::error::{AppError, Result};
use crate::models::ProbeConfig;
use crate::stats::LatencySummary;
use crate::types::RunPhase;
use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Log level enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    /// Debug level - detailed information for debugging
    Debug = 0,
    /// Info level - run progress
    Info = 1,
    /// Warning level - failed samples and suspicious configuration
    Warn = 2,
    /// Error level - the run could not complete
    Error = 3,
}

impl LogLevel {
    /// Get log level name as string
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    /// Padded level tag, colored when requested
    fn tag(&self, use_color: bool) -> String {
        let tag = format!("{:>5}", self.as_str());
        if !use_color {
            return tag;
        }
        match self {
            LogLevel::Debug => tag.cyan().to_string(),
            LogLevel::Info => tag.green().to_string(),
            LogLevel::Warn => tag.yellow().to_string(),
            LogLevel::Error => tag.red().to_string(),
        }
    }
}

/// Log entry structure for structured logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    /// Emitting component
    pub logger: String,
    /// Run id shared by every entry of one invocation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    pub fields: BTreeMap<String, serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<LogLocation>,
}

/// Source code location information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogLocation {
    pub file: String,
    pub line: u32,
    pub module: Option<String>,
}

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogFormat {
    /// Human-readable console format
    Console,
    /// JSON format for structured logging
    Json,
}

/// Where rendered entries go
#[derive(Clone)]
enum LogSink {
    Stderr,
    Buffer(Arc<Mutex<Vec<String>>>),
}

/// Rendered entries captured in memory instead of stderr
#[derive(Clone, Default)]
pub struct LogCapture {
    lines: Arc<Mutex<Vec<String>>>,
}

impl LogCapture {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|lines| lines.clone()).unwrap_or_default()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|line| line.contains(needle))
    }
}

/// Logger implementation with multiple output formats
#[derive(Clone)]
pub struct Logger {
    min_level: LogLevel,
    use_color: bool,
    include_location: bool,
    format: LogFormat,
    name: String,
    run_id: Option<String>,
    context_fields: BTreeMap<String, serde_json::Value>,
    sink: LogSink,
}

impl Logger {
    /// Create a new logger
    pub fn new(name: String) -> Self {
        Self {
            min_level: LogLevel::Warn,
            use_color: false,
            include_location: false,
            format: LogFormat::Console,
            name,
            run_id: None,
            context_fields: BTreeMap::new(),
            sink: LogSink::Stderr,
        }
    }

    /// Create a logger with specific configuration
    pub fn with_config(name: String, config: &ProbeConfig) -> Self {
        let min_level = if config.debug {
            LogLevel::Debug
        } else if config.verbose {
            LogLevel::Info
        } else {
            LogLevel::Warn
        };

        Self {
            min_level,
            use_color: config.enable_color,
            include_location: config.debug,
            format: if config.debug { LogFormat::Json } else { LogFormat::Console },
            ..Self::new(name)
        }
    }

    /// Attach the run id to every entry
    pub fn with_run_id(mut self, run_id: &str) -> Self {
        self.run_id = Some(run_id.to_string());
        self
    }

    /// Add a field attached to every entry of this logger
    pub fn with_context_field<T: Serialize>(mut self, key: &str, value: T) -> Self {
        if let Ok(json_value) = serde_json::to_value(value) {
            self.context_fields.insert(key.to_string(), json_value);
        }
        self
    }

    /// Send entries to memory instead of stderr
    pub fn capture(&mut self) -> LogCapture {
        let capture = LogCapture::default();
        self.sink = LogSink::Buffer(Arc::clone(&capture.lines));
        capture
    }

    pub fn run_id(&self) -> Option<&str> {
        self.run_id.as_deref()
    }

    /// Create a log entry builder
    pub fn log(&self, level: LogLevel, message: &str) -> LogEntryBuilder<'_> {
        LogEntryBuilder::new(self, level, message.to_string())
    }

    pub fn debug(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Debug, message)
    }

    pub fn info(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Info, message)
    }

    pub fn warn(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Warn, message)
    }

    pub fn error(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Error, message)
    }

    /// Check if a log level would be output
    pub fn would_log(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }

    fn write_entry(&self, mut entry: LogEntry) {
        if !self.would_log(entry.level) {
            return;
        }

        entry.run_id = self.run_id.clone();
        for (key, value) in &self.context_fields {
            entry.fields.entry(key.clone()).or_insert_with(|| value.clone());
        }

        let output = match self.format {
            LogFormat::Console => self.format_console(&entry),
            LogFormat::Json => self.format_json(&entry),
        };

        match &self.sink {
            LogSink::Stderr => {
                let _ = writeln!(io::stderr(), "{}", output);
            }
            LogSink::Buffer(lines) => {
                if let Ok(mut lines) = lines.lock() {
                    lines.push(output);
                }
            }
        }
    }

    fn format_console(&self, entry: &LogEntry) -> String {
        let timestamp = entry.timestamp.format("%Y-%m-%d %H:%M:%S%.3f");

        let mut output = format!(
            "{} {} [{}] {}",
            timestamp,
            entry.level.tag(self.use_color),
            entry.logger,
            entry.message
        );

        if let Some(run_id) = &entry.run_id {
            output.push_str(&format!(" [{}]", &run_id[..run_id.len().min(8)]));
        }

        if !entry.fields.is_empty() {
            let fields_str: Vec<String> = entry
                .fields
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            output.push_str(&format!(" {{{}}}", fields_str.join(", ")));
        }

        if self.include_location {
            if let Some(location) = &entry.location {
                output.push_str(&format!(" @ {}:{}", location.file, location.line));
            }
        }

        output
    }

    fn format_json(&self, entry: &LogEntry) -> String {
        match serde_json::to_string(entry) {
            Ok(json) => json,
            Err(_) => serde_json::json!({
                "error": "Failed to serialize log entry",
                "message": entry.message,
            })
            .to_string(),
        }
    }
}

/// Builder pattern for creating log entries
pub struct LogEntryBuilder<'a> {
    logger: &'a Logger,
    entry: LogEntry,
}

impl<'a> LogEntryBuilder<'a> {
    fn new(logger: &'a Logger, level: LogLevel, message: String) -> Self {
        Self {
            logger,
            entry: LogEntry {
                timestamp: Utc::now(),
                level,
                message,
                logger: logger.name.clone(),
                run_id: None,
                fields: BTreeMap::new(),
                location: None,
            },
        }
    }

    /// Add a structured field
    pub fn field<T: Serialize>(mut self, key: &str, value: T) -> Self {
        if let Ok(json_value) = serde_json::to_value(value) {
            self.entry.fields.insert(key.to_string(), json_value);
        }
        self
    }

    /// Add location information
    pub fn location(mut self, file: &str, line: u32, module: Option<&str>) -> Self {
        self.entry.location = Some(LogLocation {
            file: file.to_string(),
            line,
            module: module.map(String::from),
        });
        self
    }

    /// Add error information
    pub fn error_info(self, error: &AppError) -> Self {
        self.field("error_category", error.category())
            .field("error_recoverable", error.is_recoverable())
            .field("error", error.to_string())
    }

    /// Finalize and write the log entry
    pub fn log(self) {
        self.logger.write_entry(self.entry);
    }
}

/// Logger for measurement loop events
#[derive(Clone)]
pub struct ProbeLogger {
    logger: Logger,
}

impl ProbeLogger {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn phase(&self, phase: RunPhase) {
        self.logger
            .debug(&format!("Run phase: {}", phase.as_str()))
            .field("phase", phase)
            .log();
    }

    /// Outcome of the unmeasured warm-up request
    pub fn warm_up(&self, host: &str, result: &Result<std::time::Duration>) {
        match result {
            Ok(elapsed) => self
                .logger
                .info("Warm-up request completed")
                .field("host", host)
                .field("elapsed_ms", crate::stats::duration_to_ms(*elapsed))
                .log(),
            Err(error) => self
                .logger
                .warn(&format!("Warm-up request to {} failed: {}", host, error))
                .field("host", host)
                .error_info(error)
                .log(),
        }
    }

    /// One failed measured attempt
    pub fn attempt_failed(&self, attempt: u32, host: &str, error: &AppError) {
        self.logger
            .warn(&format!("Request to {} failed: {}", host, error))
            .field("attempt", attempt)
            .field("host", host)
            .error_info(error)
            .log();
    }

    /// One successful measured attempt
    pub fn attempt_succeeded(&self, attempt: u32, host: &str, rtt_ms: f64) {
        self.logger
            .debug("Request completed")
            .field("attempt", attempt)
            .field("host", host)
            .field("rtt_ms", rtt_ms)
            .log();
    }

    pub fn summary(&self, summary: &LatencySummary) {
        let mut builder = self
            .logger
            .info(&format!(
                "Run finished: {} succeeded, {} failed",
                summary.success_count, summary.error_count
            ))
            .field("success_count", summary.success_count)
            .field("error_count", summary.error_count)
            .field("success_rate", summary.success_rate());

        if let Some(timings) = &summary.timings {
            builder = builder
                .field("min_ms", timings.min_ms)
                .field("max_ms", timings.max_ms)
                .field("average_ms", timings.average_ms)
                .field("p90_ms", timings.p90_ms);
        }
        builder.log();
    }

    /// The run aborted before any request was sent
    pub fn aborted(&self, url: &str, error: &AppError) {
        self.logger
            .error(&format!("Cannot build request for {}: {}", url, error))
            .field("url", url)
            .error_info(error)
            .log();
    }
}

/// Creates loggers sharing one run id
pub struct LoggerFactory {
    config: ProbeConfig,
    run_id: String,
}

impl LoggerFactory {
    pub fn new(config: ProbeConfig) -> Self {
        Self {
            config,
            run_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn create_logger(&self, name: &str) -> Logger {
        Logger::with_config(name.to_string(), &self.config).with_run_id(&self.run_id)
    }

    pub fn create_probe_logger(&self) -> ProbeLogger {
        ProbeLogger::new(
            self.create_logger("PROBE").with_context_field("key_prefix", &self.config.key_prefix),
        )
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }
}

/// Debug entry tagged with the call site
#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)*) => {
        $logger.debug(&format!($($arg)*))
            .location(file!(), line!(), Some(module_path!()))
            .log()
    };
}
