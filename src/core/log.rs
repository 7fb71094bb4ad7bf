//! Purpose: Textual log sink threaded through the codec and transfer jobs.
//! Exports: `Logger`, `LogLevel`, `MemoryLogger`, `TracingLogger`, `classify`.
//! Role: The only user-visible reporting channel; callers pick where lines go.
//! Invariants: Messages carry their own classification ("Warning", "Error", ...).
//! Invariants: Logging never fails and never blocks the transfer on I/O errors.
use std::sync::Mutex;

pub trait Logger: Send + Sync {
    fn log(&self, message: &str);
}

impl<F> Logger for F
where
    F: Fn(&str) + Send + Sync,
{
    fn log(&self, message: &str) {
        self(message)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Derive a level from message text, the same way the console colors lines.
pub fn classify(message: &str) -> LogLevel {
    let lower = message.to_ascii_lowercase();
    if lower.contains("successful") {
        LogLevel::Success
    } else if lower.contains("error") || lower.contains("invalid") {
        LogLevel::Error
    } else if lower.contains("warning") || lower.contains("skipping") {
        LogLevel::Warning
    } else {
        LogLevel::Info
    }
}

/// Collects lines in memory; used by tests and by callers that render later.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    lines: Mutex<Vec<String>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_default()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|line| line.contains(needle))
    }

    pub fn count_containing(&self, needle: &str) -> usize {
        self.lines()
            .iter()
            .filter(|line| line.contains(needle))
            .count()
    }
}

impl Logger for MemoryLogger {
    fn log(&self, message: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(message.to_string());
        }
    }
}

/// Forwards lines to `tracing` at the level their text implies.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, message: &str) {
        match classify(message) {
            LogLevel::Error => tracing::error!("{message}"),
            LogLevel::Warning => tracing::warn!("{message}"),
            LogLevel::Info | LogLevel::Success => tracing::info!("{message}"),
        }
    }
}
