//! Structured logging for the experiment harness and analyzer
//!
//! This module provides:
//! - Structured logging with multiple levels and a session correlation id
//! - Debug mode JSON output with source locations
//! - Experiment progress logging (treatments and measurements)
//! - Stage timing for the analysis pipeline
//! - Error event logging for treatment-fatal and top-level failures

use crate::error::{AppError, Result};
use crate::models::{Config, Measurement};
use crate::types::QueryType;
use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Log level enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    /// Severe events that end the run
    Fatal = 5,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Fatal => "FATAL",
        }
    }

    /// Get ANSI color code for console output
    pub fn color_code(&self) -> &'static str {
        match self {
            LogLevel::Trace => "\x1b[37m",
            LogLevel::Debug => "\x1b[36m",
            LogLevel::Info => "\x1b[32m",
            LogLevel::Warn => "\x1b[33m",
            LogLevel::Error => "\x1b[31m",
            LogLevel::Fatal => "\x1b[35m",
        }
    }

    pub fn reset_code() -> &'static str {
        "\x1b[0m"
    }
}

impl std::str::FromStr for LogLevel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "TRACE" => Ok(LogLevel::Trace),
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            "FATAL" => Ok(LogLevel::Fatal),
            _ => Err(AppError::parse(format!("Invalid log level: {}", s))),
        }
    }
}

/// Log entry structure for structured logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    /// Logger name/component
    pub logger: String,
    /// Correlation ID for tracking related events
    pub correlation_id: Option<String>,
    /// Additional structured fields, ordered for stable output
    pub fields: BTreeMap<String, serde_json::Value>,
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
    /// Compact single-line format
    Compact,
}

/// Shared logging context for correlation and session tracking
#[derive(Debug, Default)]
struct LogContext {
    session_id: Option<String>,
    current_correlation_id: Option<String>,
    context_fields: BTreeMap<String, serde_json::Value>,
}

/// Logger implementation with multiple output formats
#[derive(Clone)]
pub struct Logger {
    min_level: LogLevel,
    use_color: bool,
    include_location: bool,
    format: LogFormat,
    name: String,
    context: Arc<RwLock<LogContext>>,
}

impl Logger {
    /// Create a new logger
    pub fn new(name: String) -> Self {
        Self {
            min_level: LogLevel::Info,
            use_color: true,
            include_location: false,
            format: LogFormat::Console,
            name,
            context: Arc::new(RwLock::new(LogContext::default())),
        }
    }

    /// Create a logger with specific configuration
    pub fn with_config(name: String, config: &Config) -> Self {
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
            name,
            context: Arc::new(RwLock::new(LogContext::default())),
        }
    }

    /// Create a configured logger already bound to a session
    pub fn with_session(name: String, config: &Config, session_id: &str) -> Self {
        let logger = Self::with_config(name, config);
        let context = LogContext {
            session_id: Some(session_id.to_string()),
            ..LogContext::default()
        };
        Self {
            context: Arc::new(RwLock::new(context)),
            ..logger
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_level(&mut self, level: LogLevel) {
        self.min_level = level;
    }

    pub fn set_format(&mut self, format: LogFormat) {
        self.format = format;
    }

    pub fn set_color(&mut self, use_color: bool) {
        self.use_color = use_color;
    }

    /// Set session correlation ID
    pub async fn set_session_id(&self, session_id: String) {
        let mut context = self.context.write().await;
        context.session_id = Some(session_id);
    }

    /// Add context field for all subsequent log entries
    pub async fn add_context_field<T: Serialize>(&self, key: String, value: T) {
        if let Ok(json_value) = serde_json::to_value(value) {
            let mut context = self.context.write().await;
            context.context_fields.insert(key, json_value);
        }
    }

    /// Start a correlated operation
    pub async fn start_operation(&self, operation_name: &str) -> String {
        let correlation_id = Uuid::new_v4().to_string();
        {
            let mut context = self.context.write().await;
            context.current_correlation_id = Some(correlation_id.clone());
        }

        self.info(&format!("Started operation: {}", operation_name))
            .correlation_id(&correlation_id)
            .field("operation", operation_name)
            .field("operation_type", "start")
            .log()
            .await;

        correlation_id
    }

    /// End a correlated operation
    pub async fn end_operation(&self, correlation_id: &str, operation_name: &str, success: bool) {
        self.info(&format!("Completed operation: {} (success: {})", operation_name, success))
            .correlation_id(correlation_id)
            .field("operation", operation_name)
            .field("operation_type", "end")
            .field("success", success)
            .log()
            .await;

        let mut context = self.context.write().await;
        if context.current_correlation_id.as_deref() == Some(correlation_id) {
            context.current_correlation_id = None;
        }
    }

    /// Create a log entry builder
    pub fn log(&self, level: LogLevel, message: &str) -> LogEntryBuilder<'_> {
        LogEntryBuilder::new(self, level, message.to_string())
    }

    pub fn trace(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Trace, message)
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

    pub fn fatal(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Fatal, message)
    }

    /// Check if a log level would be output
    pub fn would_log(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }

    async fn write_entry(&self, mut entry: LogEntry) {
        if entry.level < self.min_level {
            return;
        }

        let context = self.context.read().await;
        if let Some(session_id) = &context.session_id {
            entry.fields.insert("session_id".to_string(), serde_json::Value::String(session_id.clone()));
        }
        if entry.correlation_id.is_none() {
            entry.correlation_id = context.current_correlation_id.clone();
        }
        for (key, value) in &context.context_fields {
            entry.fields.entry(key.clone()).or_insert_with(|| value.clone());
        }
        drop(context);

        let output = match self.format {
            LogFormat::Console => self.format_console(&entry),
            LogFormat::Json => self.format_json(&entry),
            LogFormat::Compact => self.format_compact(&entry),
        };

        // Warn and above go to stderr
        if entry.level >= LogLevel::Warn {
            let _ = writeln!(io::stderr(), "{}", output);
        } else {
            let _ = writeln!(io::stdout(), "{}", output);
        }
    }

    fn format_console(&self, entry: &LogEntry) -> String {
        let timestamp = entry.timestamp.format("%Y-%m-%d %H:%M:%S%.3f");
        let level_str = entry.level.as_str();

        let formatted_level = if self.use_color {
            format!("{}{:>5}{}", entry.level.color_code(), level_str, LogLevel::reset_code())
        } else {
            format!("{:>5}", level_str)
        };

        let mut output = format!("{} {} [{}] {}", timestamp, formatted_level, entry.logger, entry.message);

        if let Some(correlation_id) = &entry.correlation_id {
            let short: String = correlation_id.chars().take(8).collect();
            output.push_str(&format!(" [{}]", short));
        }

        let shown: Vec<String> = entry
            .fields
            .iter()
            .filter(|(k, _)| k.as_str() != "session_id")
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        if !shown.is_empty() {
            output.push_str(&format!(" {{{}}}", shown.join(", ")));
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
            Err(_) => format!(
                "{{\"error\": \"Failed to serialize log entry\", \"message\": {:?}}}",
                entry.message
            ),
        }
    }

    fn format_compact(&self, entry: &LogEntry) -> String {
        let timestamp = entry.timestamp.format("%H:%M:%S");
        format!(
            "{} {} {}: {}",
            timestamp,
            entry.level.as_str().chars().next().unwrap_or('?'),
            entry.logger,
            entry.message
        )
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
                correlation_id: None,
                fields: BTreeMap::new(),
                location: None,
            },
        }
    }

    pub fn correlation_id(mut self, id: &str) -> Self {
        self.entry.correlation_id = Some(id.to_string());
        self
    }

    /// Add a structured field
    pub fn field<T: Serialize>(mut self, key: &str, value: T) -> Self {
        if let Ok(json_value) = serde_json::to_value(value) {
            self.entry.fields.insert(key.to_string(), json_value);
        }
        self
    }

    pub fn location(mut self, file: &str, line: u32, module: Option<&str>) -> Self {
        self.entry.location = Some(LogLocation {
            file: file.to_string(),
            line,
            module: module.map(String::from),
        });
        self
    }

    /// Add the fields of one measurement
    pub fn measurement(self, measurement: &Measurement) -> Self {
        self.field("api_type", measurement.api_type)
            .field("query_type", measurement.query_type)
            .field("query_name", &measurement.query_name)
            .field("response_time_ms", measurement.response_time_ms)
            .field("response_size_bytes", measurement.response_size_bytes)
            .field("success", measurement.success)
            .field("error_msg", &measurement.error_msg)
    }

    /// Add error information
    pub fn error_info(self, error: &AppError) -> Self {
        self.field("error_category", error.category())
            .field("error_recoverable", error.is_recoverable())
            .field("error_exit_code", error.exit_code())
    }

    /// Finalize and write the log entry
    pub async fn log(self) {
        self.logger.write_entry(self.entry).await;
    }
}

/// Logger for the measurement run: treatment boundaries and per-measurement outcomes
pub struct ExperimentLogger {
    logger: Logger,
    use_color: bool,
    progress: bool,
}

impl ExperimentLogger {
    pub fn new(config: &Config) -> Self {
        Self {
            logger: Logger::with_config("RUN".to_string(), config),
            use_color: config.enable_color,
            progress: true,
        }
    }

    fn bound(logger: Logger, config: &Config) -> Self {
        Self {
            logger,
            use_color: config.enable_color,
            progress: true,
        }
    }

    /// Enable or disable the human progress lines on stdout
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    fn progress_line(&self, line: String) {
        if self.progress {
            let _ = writeln!(io::stdout(), "{}", line);
        }
    }

    pub async fn log_run_started(&self, order: &[QueryType], repetitions: u32, randomize: bool) {
        let names: Vec<&str> = order.iter().map(|q| q.as_str()).collect();
        self.progress_line(format!(
            "Treatment order: {} ({} repetitions{})",
            names.join(" -> "),
            repetitions,
            if randomize { ", randomized" } else { "" }
        ));

        self.logger
            .info("Experiment run started")
            .field("order", &names)
            .field("repetitions", repetitions)
            .field("randomize", randomize)
            .log()
            .await;
    }

    pub async fn log_treatment_started(&self, query_type: QueryType, index: usize, total: usize) {
        let header = format!("[{}/{}] Treatment: {}", index + 1, total, query_type);
        self.progress_line(if self.use_color {
            header.bold().to_string()
        } else {
            header
        });

        self.logger
            .info(&format!("Treatment {} started", query_type))
            .field("query_type", query_type)
            .field("index", index)
            .log()
            .await;
    }

    pub async fn log_measurement(&self, measurement: &Measurement, repetition: u32, repetitions: u32) {
        let line = if measurement.success {
            let text = format!(
                "  {:>3}/{} {:<7} {:.1}ms {} bytes",
                repetition + 1,
                repetitions,
                measurement.api_type.as_str(),
                measurement.response_time_ms,
                measurement.response_size_bytes
            );
            if self.use_color { text.green().to_string() } else { text }
        } else {
            let text = format!(
                "  {:>3}/{} {:<7} failed: {}",
                repetition + 1,
                repetitions,
                measurement.api_type.as_str(),
                measurement.error_msg.as_deref().unwrap_or("unknown error")
            );
            if self.use_color { text.red().to_string() } else { text }
        };
        self.progress_line(line);

        let level = if measurement.success { LogLevel::Debug } else { LogLevel::Warn };
        self.logger
            .log(level, "Measurement recorded")
            .field("repetition", repetition)
            .measurement(measurement)
            .log()
            .await;
    }

    pub async fn log_treatment_finished(&self, query_type: QueryType, recorded: usize, failed: usize) {
        self.logger
            .info(&format!("Treatment {} finished", query_type))
            .field("query_type", query_type)
            .field("recorded", recorded)
            .field("failed", failed)
            .log()
            .await;
    }

    pub async fn log_run_finished(&self, total: usize, failed: usize, abandoned: &[QueryType]) {
        let summary = format!("Run finished: {} measurements, {} failed", total, failed);
        self.progress_line(if self.use_color && failed > 0 {
            summary.yellow().to_string()
        } else {
            summary
        });

        self.logger
            .info("Experiment run finished")
            .field("total", total)
            .field("failed", failed)
            .field("abandoned", abandoned)
            .log()
            .await;
    }
}

/// Stage timing logger for the analysis pipeline
pub struct PerformanceLogger {
    logger: Logger,
    start_times: BTreeMap<String, DateTime<Utc>>,
    operation_stack: Vec<String>,
}

impl PerformanceLogger {
    pub fn new(config: &Config) -> Self {
        Self::from_logger(Logger::with_config("PERF".to_string(), config))
    }

    fn from_logger(logger: Logger) -> Self {
        Self {
            logger,
            start_times: BTreeMap::new(),
            operation_stack: Vec::new(),
        }
    }

    /// Start timing an operation
    pub async fn start_timing(&mut self, operation: &str) {
        let start_time = Utc::now();
        self.start_times.insert(operation.to_string(), start_time);
        self.operation_stack.push(operation.to_string());

        self.logger
            .debug(&format!("Started timing: {}", operation))
            .field("operation", operation)
            .field("start_time", start_time)
            .log()
            .await;
    }

    /// End timing an operation and log the duration
    pub async fn end_timing(&mut self, operation: &str) -> Option<chrono::Duration> {
        let Some(start_time) = self.start_times.remove(operation) else {
            self.logger
                .warn(&format!("Attempted to end timing for unknown operation: {}", operation))
                .field("operation", operation)
                .log()
                .await;
            return None;
        };

        let end_time = Utc::now();
        let duration = end_time - start_time;

        if let Some(pos) = self.operation_stack.iter().position(|x| x == operation) {
            self.operation_stack.remove(pos);
        }

        self.logger
            .info(&format!("Completed timing: {} in {}ms", operation, duration.num_milliseconds()))
            .field("operation", operation)
            .field("duration_ms", duration.num_milliseconds())
            .log()
            .await;

        Some(duration)
    }

    /// Log a finished analysis stage with its row count
    pub async fn log_stage_complete(&self, stage: &str, rows: usize, skipped: usize) {
        self.logger
            .info(&format!("Stage '{}' produced {} row(s), skipped {}", stage, rows, skipped))
            .field("stage", stage)
            .field("rows", rows)
            .field("skipped", skipped)
            .log()
            .await;
    }

    pub fn active_operations(&self) -> &[String] {
        &self.operation_stack
    }
}

/// Error event logger with enhanced context
pub struct ErrorEventLogger {
    logger: Logger,
}

impl ErrorEventLogger {
    pub fn new(config: &Config) -> Self {
        Self {
            logger: Logger::with_config("ERR".to_string(), config),
        }
    }

    /// Log an application error with full context
    pub async fn log_error(&self, error: &AppError, context: Option<&str>, correlation_id: Option<&str>) {
        let message = match context {
            Some(ctx) => format!("{}: {}", ctx, error),
            None => error.to_string(),
        };

        let mut builder = self.logger.error(&message).error_info(error);
        if let Some(id) = correlation_id {
            builder = builder.correlation_id(id);
        }
        if let Some(ctx) = context {
            builder = builder.field("context", ctx);
        }

        builder.log().await;
    }

    /// Log a treatment abandoned after a fatal failure
    pub async fn log_treatment_fatal(&self, query_type: QueryType, error: &AppError) {
        self.logger
            .error(&format!("Treatment {} abandoned: {}", query_type, error))
            .field("query_type", query_type)
            .error_info(error)
            .log()
            .await;
    }

    /// Log an error that ended the run before the partial flush
    pub async fn log_top_level(&self, error: &AppError, flushed: Option<&str>) {
        self.logger
            .fatal(&format!("Run aborted: {}", error))
            .error_info(error)
            .field("flushed", flushed)
            .log()
            .await;
    }
}

/// Logger factory binding every logger to one session id
pub struct LoggerFactory {
    config: Config,
    session_id: String,
}

impl LoggerFactory {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            session_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create a logger with a specific name
    pub fn create_logger(&self, name: &str) -> Logger {
        Logger::with_session(name.to_string(), &self.config, &self.session_id)
    }

    pub fn create_experiment_logger(&self) -> ExperimentLogger {
        ExperimentLogger::bound(self.create_logger("RUN"), &self.config)
    }

    pub fn create_performance_logger(&self) -> PerformanceLogger {
        PerformanceLogger::from_logger(self.create_logger("PERF"))
    }

    pub fn create_error_logger(&self) -> ErrorEventLogger {
        ErrorEventLogger {
            logger: self.create_logger("ERR"),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

/// Convenience macros for logging with location information
#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)*) => {
        $logger.debug(&format!($($arg)*))
            .location(file!(), line!(), Some(module_path!()))
            .log()
            .await
    };
}

#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)*) => {
        $logger.info(&format!($($arg)*))
            .location(file!(), line!(), Some(module_path!()))
            .log()
            .await
    };
}

#[macro_export]
macro_rules! log_warn {
    ($logger:expr, $($arg:tt)*) => {
        $logger.warn(&format!($($arg)*))
            .location(file!(), line!(), Some(module_path!()))
            .log()
            .await
    };
}
