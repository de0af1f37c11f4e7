use std::sync::{Arc, Mutex, Once};

use tracing::Level;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// A message kept by a capturing logger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub level: Level,
    pub message: String,
}

/// Prefixing logger handed to components instead of a global.
///
/// Every message goes to `tracing`. A logger built with [`Logger::capturing`]
/// also keeps the prefixed messages in memory; clones and prefixed children
/// share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct Logger {
    prefixes: Vec<String>,
    captured: Option<Arc<Mutex<Vec<LogRecord>>>>,
}

impl Logger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn capturing() -> Self {
        Self {
            prefixes: Vec::new(),
            captured: Some(Arc::new(Mutex::new(Vec::new()))),
        }
    }

    pub fn with_prefix(&self, prefix: impl Into<String>) -> Self {
        let mut child = self.clone();
        child.prefixes.push(prefix.into());
        child
    }

    pub fn info(&self, message: &str) {
        let line = self.line(message);
        tracing::info!("{}", line);
        self.record(Level::INFO, line);
    }

    pub fn warn(&self, message: &str) {
        let line = self.line(message);
        tracing::warn!("{}", line);
        self.record(Level::WARN, line);
    }

    pub fn error(&self, message: &str) {
        let line = self.line(message);
        tracing::error!("{}", line);
        self.record(Level::ERROR, line);
    }

    pub fn debug(&self, message: &str) {
        let line = self.line(message);
        tracing::debug!("{}", line);
        self.record(Level::DEBUG, line);
    }

    /// Captured messages, oldest first. Empty for non-capturing loggers.
    pub fn records(&self) -> Vec<LogRecord> {
        self.captured
            .as_ref()
            .and_then(|buf| buf.lock().ok().map(|records| records.clone()))
            .unwrap_or_default()
    }

    fn line(&self, message: &str) -> String {
        let prefix = self
            .prefixes
            .iter()
            .map(|p| format!("{} ", p))
            .collect::<String>();
        format!("{}{}", prefix, message)
    }

    fn record(&self, level: Level, message: String) {
        if let Some(buf) = &self.captured {
            if let Ok(mut records) = buf.lock() {
                records.push(LogRecord { level, message });
            }
        }
    }
}

/// Install the process-wide `tracing` subscriber once. `RUST_LOG` wins over
/// `default_filter`.
pub fn init_logging(default_filter: &str) -> Logger {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_filter));
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    });
    Logger::new()
}
