//! Diagnostics logging with an injectable sink.
//!
//! Every record goes to `tracing`. When a `DiagnosticSink` is attached, the
//! same record is also handed to it, so embedders decide where recoverable
//! store failures end up.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::{
    Arc,
    atomic::{AtomicU8, Ordering},
};
use tracing::Level;

/// Diagnostic severity, lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
}

impl std::str::FromStr for DiagLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(DiagLevel::Debug),
            "info" => Ok(DiagLevel::Info),
            "warn" | "warning" => Ok(DiagLevel::Warning),
            "error" => Ok(DiagLevel::Error),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

impl fmt::Display for DiagLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagLevel::Debug => write!(f, "debug"),
            DiagLevel::Info => write!(f, "info"),
            DiagLevel::Warning => write!(f, "warning"),
            DiagLevel::Error => write!(f, "error"),
        }
    }
}

/// Atomic minimum-level filter shared between logger clones.
pub struct LogLevelFilter(AtomicU8);

impl LogLevelFilter {
    pub fn new(level: DiagLevel) -> Self {
        Self(AtomicU8::new(level as u8))
    }

    pub fn get(&self) -> DiagLevel {
        u8_to_level(self.0.load(Ordering::Relaxed))
    }

    pub fn set(&self, level: DiagLevel) {
        self.0.store(level as u8, Ordering::Relaxed);
    }

    pub fn should_log(&self, level: DiagLevel) -> bool {
        level as u8 >= self.0.load(Ordering::Relaxed)
    }
}

impl Default for LogLevelFilter {
    fn default() -> Self {
        Self::new(DiagLevel::Debug)
    }
}

fn u8_to_level(val: u8) -> DiagLevel {
    match val {
        0 => DiagLevel::Debug,
        1 => DiagLevel::Info,
        2 => DiagLevel::Warning,
        _ => DiagLevel::Error,
    }
}

/// Map a diagnostic level onto tracing's.
pub fn diag_level_to_tracing(level: DiagLevel) -> Level {
    match level {
        DiagLevel::Debug => Level::DEBUG,
        DiagLevel::Info => Level::INFO,
        DiagLevel::Warning => Level::WARN,
        DiagLevel::Error => Level::ERROR,
    }
}

/// One record handed to a sink.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub level: DiagLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logger: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Callback receiving diagnostics.
pub type DiagnosticSink = Arc<dyn Fn(&Diagnostic) + Send + Sync>;

/// Named logger writing to tracing and an optional sink.
#[derive(Clone)]
pub struct Logger {
    sink: Option<DiagnosticSink>,
    level_filter: Arc<LogLevelFilter>,
    name: Option<String>,
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("level", &self.level_filter.get())
            .field("sink", &self.sink.is_some())
            .finish()
    }
}

impl Logger {
    pub fn new() -> Self {
        Self {
            sink: None,
            level_filter: Arc::new(LogLevelFilter::default()),
            name: None,
        }
    }

    pub fn with_sink(mut self, sink: DiagnosticSink) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn with_level_filter(mut self, filter: Arc<LogLevelFilter>) -> Self {
        self.level_filter = filter;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Clone sharing sink and filter, under a different name.
    pub fn named(&self, name: impl Into<String>) -> Self {
        self.clone().with_name(name)
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn log(&self, level: DiagLevel, message: &str, data: Option<Value>) {
        if !self.level_filter.should_log(level) {
            return;
        }

        let logger = self.name.as_deref().unwrap_or("layered_config");
        match diag_level_to_tracing(level) {
            Level::ERROR => tracing::error!(logger, data = ?data, "{}", message),
            Level::WARN => tracing::warn!(logger, data = ?data, "{}", message),
            Level::INFO => tracing::info!(logger, data = ?data, "{}", message),
            _ => tracing::debug!(logger, data = ?data, "{}", message),
        }

        if let Some(ref sink) = self.sink {
            sink(&Diagnostic {
                level,
                logger: self.name.clone(),
                message: message.to_string(),
                data,
            });
        }
    }

    pub fn log_with_data(&self, level: DiagLevel, message: &str, data: Value) {
        self.log(level, message, Some(data));
    }

    pub fn debug(&self, msg: &str) {
        self.log(DiagLevel::Debug, msg, None);
    }

    pub fn warning(&self, msg: &str) {
        self.log(DiagLevel::Warning, msg, None);
    }

    pub fn error(&self, msg: &str) {
        self.log(DiagLevel::Error, msg, None);
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}
