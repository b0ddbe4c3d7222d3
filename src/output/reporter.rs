//! Reporting Sink
//!
//! The project and the renderer report progress through a [`Reporter`]
//! supplied by the caller instead of writing to a global logger.
//! [`LogReporter`] forwards to the `log` facade; [`MemoryReporter`] keeps
//! messages for inspection.

use std::fmt;
use std::sync::Mutex;

use log::{debug, info};

/// Severity of a reported message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportLevel {
    Info,
    Debug,
}

pub trait Reporter: Send + Sync {
    fn info(&self, message: &str);
    fn debug(&self, message: &str);
}

/// Forwards reports to the `log` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn info(&self, message: &str) {
        info!("{}", message);
    }

    fn debug(&self, message: &str) {
        debug!("{}", message);
    }
}

/// Records every report in memory.
#[derive(Default)]
pub struct MemoryReporter {
    entries: Mutex<Vec<(ReportLevel, String)>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages recorded so far, oldest first.
    pub fn entries(&self) -> Vec<(ReportLevel, String)> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    /// Messages recorded at `level`.
    pub fn messages(&self, level: ReportLevel) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, message)| message)
            .collect()
    }

    fn record(&self, level: ReportLevel, message: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push((level, message.to_string()));
        }
    }
}

impl fmt::Debug for MemoryReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryReporter")
            .field("entries", &self.entries().len())
            .finish()
    }
}

impl Reporter for MemoryReporter {
    fn info(&self, message: &str) {
        self.record(ReportLevel::Info, message);
    }

    fn debug(&self, message: &str) {
        self.record(ReportLevel::Debug, message);
    }
}
