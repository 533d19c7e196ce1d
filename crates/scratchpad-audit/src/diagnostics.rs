//! Diagnostic sink for the evidence pipeline.
//!
//! Components report failures and progress through a [`Diagnostics`] handle
//! they are given at construction instead of logging globally, so tests can
//! capture exactly what was emitted.

use std::fmt;
use std::sync::{Mutex, PoisonError};

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warn,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warn => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// Destination for pipeline diagnostics.
pub trait Diagnostics: Send + Sync {
    fn emit(&self, severity: Severity, message: &str);

    fn info(&self, message: &str) {
        self.emit(Severity::Info, message);
    }

    fn warn(&self, message: &str) {
        self.emit(Severity::Warn, message);
    }

    fn error(&self, message: &str) {
        self.emit(Severity::Error, message);
    }
}

/// Forwards diagnostics to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn emit(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Info => tracing::info!(target: "scratchpad_audit", "{message}"),
            Severity::Warn => tracing::warn!(target: "scratchpad_audit", "{message}"),
            Severity::Error => tracing::error!(target: "scratchpad_audit", "{message}"),
        }
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDiagnostics;

impl Diagnostics for NullDiagnostics {
    fn emit(&self, _severity: Severity, _message: &str) {}
}

/// Keeps diagnostics in memory.
#[derive(Debug, Default)]
pub struct MemoryDiagnostics {
    entries: Mutex<Vec<(Severity, String)>>,
}

impl MemoryDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything emitted so far, in order.
    pub fn entries(&self) -> Vec<(Severity, String)> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Messages emitted at `severity`.
    pub fn messages(&self, severity: Severity) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|(s, _)| *s == severity)
            .map(|(_, m)| m)
            .collect()
    }

    /// Number of diagnostics emitted at `severity`.
    pub fn count(&self, severity: Severity) -> usize {
        self.messages(severity).len()
    }
}

impl Diagnostics for MemoryDiagnostics {
    fn emit(&self, severity: Severity, message: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((severity, message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_diagnostics_capture() {
        let diagnostics = MemoryDiagnostics::new();
        diagnostics.info("rotation started");
        diagnostics.error("audit path missing");
        diagnostics.error("audit path missing");

        assert_eq!(diagnostics.count(Severity::Info), 1);
        assert_eq!(diagnostics.count(Severity::Error), 2);
        assert_eq!(diagnostics.count(Severity::Warn), 0);
        assert_eq!(diagnostics.entries()[0], (Severity::Info, "rotation started".to_string()));
    }
}
