//! Progress reporting sinks
//!
//! Benchmarks and the suite runner report through a [`LogSink`] with four severities. A sink must
//! never influence a measurement, so every method is infallible.

use chrono::Local;
use colored::*;
use std::sync::Mutex;

/// Severity of a log line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Success,
    Error,
    Warning,
}

impl LogLevel {
    pub fn label(&self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Success => "SUCCESS",
            LogLevel::Error => "ERROR",
            LogLevel::Warning => "WARNING",
        }
    }
}

/// Destination for benchmark progress messages.
pub trait LogSink: Send + Sync {
    fn info(&self, message: &str);
    fn success(&self, message: &str);
    fn error(&self, message: &str);
    fn warning(&self, message: &str);

    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Info => self.info(message),
            LogLevel::Success => self.success(message),
            LogLevel::Error => self.error(message),
            LogLevel::Warning => self.warning(message),
        }
    }
}

/// Plain stdout fallback used when no sink is supplied.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl LogSink for StdoutSink {
    fn info(&self, message: &str) {
        println!("{message}");
    }

    fn success(&self, message: &str) {
        println!("{message}");
    }

    fn error(&self, message: &str) {
        println!("{message}");
    }

    fn warning(&self, message: &str) {
        println!("{message}");
    }
}

/// `message` prefixed with its severity tag, e.g. `[WARNING] no adapter`.
fn tagged(level: LogLevel, message: &str) -> String {
    format!("[{}] {message}", level.label())
}

/// Timestamped, colour-coded terminal log.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl ConsoleSink {
    fn write(&self, level: LogLevel, message: &str) {
        let timestamp = Local::now().format("[%H:%M:%S]").to_string();
        let line = tagged(level, message);
        let body = match level {
            LogLevel::Info => line.bright_blue(),
            LogLevel::Success => line.bright_green(),
            LogLevel::Error => line.bright_red(),
            LogLevel::Warning => line.bright_yellow(),
        };
        println!("{} {}", timestamp.dimmed(), body);
    }
}

impl LogSink for ConsoleSink {
    fn info(&self, message: &str) {
        self.write(LogLevel::Info, message);
    }

    fn success(&self, message: &str) {
        self.write(LogLevel::Success, message);
    }

    fn error(&self, message: &str) {
        self.write(LogLevel::Error, message);
    }

    fn warning(&self, message: &str) {
        self.write(LogLevel::Warning, message);
    }
}

/// Forwards progress to `tracing`, keeping stdout free for machine-readable output.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn info(&self, message: &str) {
        tracing::info!("{message}");
    }

    fn success(&self, message: &str) {
        tracing::info!(outcome = "success", "{message}");
    }

    fn error(&self, message: &str) {
        tracing::error!("{message}");
    }

    fn warning(&self, message: &str) {
        tracing::warn!("{message}");
    }
}

/// Records every line in memory, for embedders that render the log themselves.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<(LogLevel, String)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all lines recorded so far.
    pub fn entries(&self) -> Vec<(LogLevel, String)> {
        match self.entries.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.entries().into_iter().map(|(_, msg)| msg).collect()
    }

    fn push(&self, level: LogLevel, message: &str) {
        let mut guard = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.push((level, message.to_string()));
    }
}

impl LogSink for MemorySink {
    fn info(&self, message: &str) {
        self.push(LogLevel::Info, message);
    }

    fn success(&self, message: &str) {
        self.push(LogLevel::Success, message);
    }

    fn error(&self, message: &str) {
        self.push(LogLevel::Error, message);
    }

    fn warning(&self, message: &str) {
        self.push(LogLevel::Warning, message);
    }
}
