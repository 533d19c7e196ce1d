//! Event writer: appends evidence lines to the day's store.
//!
//! Each call resolves the store name from the clock, opens it in
//! append-create mode, writes the whole line with a single write, syncs and
//! closes. Appends are serialized through an internal mutex so concurrent
//! requests never interleave bytes within a line.

use scratchpad_core::AuditConfig;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::clock::{Clock, SystemClock};
use crate::diagnostics::{Diagnostics, NullDiagnostics, TracingDiagnostics};
use crate::error::AuditError;
use crate::event::AuditEvent;
use crate::layout::{EvidenceLayout, store_name_for};

/// Health of the capture path as seen by the writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureHealth {
    /// The last append succeeded (or nothing was written yet).
    Ok,
    /// The last `failures` appends were dropped.
    Degraded { failures: u64 },
    /// Capture is switched off.
    Disabled,
}

/// Appends audit events to the day-partitioned evidence stores.
pub struct EventWriter {
    layout: EvidenceLayout,
    clock: Arc<dyn Clock>,
    diagnostics: Arc<dyn Diagnostics>,
    enabled: bool,
    append_lock: Mutex<()>,
    consecutive_failures: AtomicU64,
}

impl EventWriter {
    /// Create a writer for the evidence root `root`.
    pub fn new(
        root: impl Into<PathBuf>,
        clock: Arc<dyn Clock>,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> Self {
        Self {
            layout: EvidenceLayout::new(root),
            clock,
            diagnostics,
            enabled: true,
            append_lock: Mutex::new(()),
            consecutive_failures: AtomicU64::new(0),
        }
    }

    /// Create a writer from configuration, using the wall clock and tracing.
    pub fn from_config(config: &AuditConfig) -> Self {
        if !config.enabled {
            return Self::disabled();
        }
        Self::new(
            &config.evidence_dir,
            Arc::new(SystemClock),
            Arc::new(TracingDiagnostics),
        )
    }

    /// Create a disabled (no-op) writer.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new(PathBuf::new(), Arc::new(SystemClock), Arc::new(NullDiagnostics))
        }
    }

    /// Check if capture is enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The evidence root.
    pub fn root(&self) -> &Path {
        self.layout.root()
    }

    /// Record an event, failing safe.
    ///
    /// Any failure is reported once at error severity through the diagnostics
    /// sink and the event is discarded; nothing is returned to the caller.
    pub fn record(&self, event: &AuditEvent) {
        if !self.enabled {
            return;
        }

        match self.try_record(event) {
            Ok(_) => {
                self.consecutive_failures.store(0, Ordering::Relaxed);
            }
            Err(err) => {
                self.consecutive_failures.fetch_add(1, Ordering::Relaxed);
                self.diagnostics
                    .error(&format!("audit event dropped ({} {}): {err}", event.method, event.path));
            }
        }
    }

    /// Append an event and return the store it landed in.
    pub fn try_record(&self, event: &AuditEvent) -> Result<PathBuf, AuditError> {
        self.layout.ensure_available()?;

        let path = self.layout.root().join(store_name_for(self.clock.now()));
        let line = event.to_json_line()?;

        let _guard = self
            .append_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let append = |path: &Path| -> std::io::Result<()> {
            let mut file = OpenOptions::new().create(true).append(true).open(path)?;
            file.write_all(line.as_bytes())?;
            file.flush()?;
            file.sync_data()
        };
        append(&path).map_err(|source| AuditError::AppendFailed {
            path: path.clone(),
            source,
        })?;

        Ok(path)
    }

    /// Number of events dropped since the last successful append.
    pub fn consecutive_failures(&self) -> u64 {
        self.consecutive_failures.load(Ordering::Relaxed)
    }

    /// Current capture health.
    pub fn health(&self) -> CaptureHealth {
        if !self.enabled {
            return CaptureHealth::Disabled;
        }
        match self.consecutive_failures() {
            0 => CaptureHealth::Ok,
            failures => CaptureHealth::Degraded { failures },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::diagnostics::{MemoryDiagnostics, Severity};
    use chrono::{Duration, TimeZone, Utc};
    use std::fs;

    fn clock() -> Arc<FixedClock> {
        Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2025, 10, 16, 12, 0, 0).unwrap(),
        ))
    }

    fn event(method: &str, path: &str, status: u16) -> AuditEvent {
        AuditEvent::builder(Utc.with_ymd_and_hms(2025, 10, 16, 12, 0, 0).unwrap(), method, path)
            .remote_identity("127.0.0.1:40000")
            .status(status)
            .duration_ms(3)
            .build()
    }

    fn read_events(path: &Path) -> Vec<AuditEvent> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| AuditEvent::from_json_line(line).unwrap())
            .collect()
    }

    #[test]
    fn test_first_event_creates_daily_store() {
        let dir = tempfile::tempdir().unwrap();
        let writer = EventWriter::new(dir.path(), clock(), Arc::new(MemoryDiagnostics::new()));

        let path = writer.try_record(&event("GET", "/folders", 200)).unwrap();

        assert_eq!(path, dir.path().join("requests_2025-10-16.log"));
        assert_eq!(read_events(&path), vec![event("GET", "/folders", 200)]);
    }

    #[test]
    fn test_appends_never_truncate() {
        let dir = tempfile::tempdir().unwrap();
        let writer = EventWriter::new(dir.path(), clock(), Arc::new(MemoryDiagnostics::new()));

        writer.record(&event("GET", "/folders", 200));
        writer.record(&event("POST", "/folders", 201));

        let events = read_events(&dir.path().join("requests_2025-10-16.log"));
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].status, 201);
    }

    #[test]
    fn test_midnight_switches_store() {
        let dir = tempfile::tempdir().unwrap();
        let clock = clock();
        let writer = EventWriter::new(dir.path(), clock.clone(), Arc::new(MemoryDiagnostics::new()));

        writer.record(&event("GET", "/folders", 200));
        clock.advance(Duration::hours(12));
        writer.record(&event("GET", "/files", 200));

        assert_eq!(read_events(&dir.path().join("requests_2025-10-16.log")).len(), 1);
        assert_eq!(read_events(&dir.path().join("requests_2025-10-17.log")).len(), 1);
    }

    #[test]
    fn test_missing_root_drops_event_with_one_error() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("logs");
        let diagnostics = Arc::new(MemoryDiagnostics::new());
        let writer = EventWriter::new(&root, clock(), diagnostics.clone());

        writer.record(&event("GET", "/folders", 200));

        assert!(!root.exists());
        assert_eq!(diagnostics.count(Severity::Error), 1);
        assert!(diagnostics.messages(Severity::Error)[0].contains("audit path missing"));
        assert_eq!(writer.health(), CaptureHealth::Degraded { failures: 1 });
    }

    #[test]
    fn test_health_recovers_after_success() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("logs");
        let writer = EventWriter::new(&root, clock(), Arc::new(MemoryDiagnostics::new()));

        writer.record(&event("GET", "/a", 200));
        writer.record(&event("GET", "/b", 200));
        assert_eq!(writer.consecutive_failures(), 2);

        fs::create_dir(&root).unwrap();
        writer.record(&event("GET", "/c", 200));
        assert_eq!(writer.health(), CaptureHealth::Ok);
    }

    #[test]
    fn test_disabled_writer_is_silent() {
        let writer = EventWriter::disabled();
        assert!(!writer.is_enabled());
        writer.record(&event("GET", "/folders", 200));
        assert_eq!(writer.health(), CaptureHealth::Disabled);
    }

    #[test]
    fn test_concurrent_records_stay_whole() {
        let dir = tempfile::tempdir().unwrap();
        let writer = EventWriter::new(dir.path(), clock(), Arc::new(MemoryDiagnostics::new()));
        let long_path = format!("/file?path={}", "x".repeat(2048));

        std::thread::scope(|scope| {
            for worker in 0..8 {
                let writer = &writer;
                let long_path = &long_path;
                scope.spawn(move || {
                    for i in 0..25 {
                        let path = if i % 2 == 0 { long_path.as_str() } else { "/folders" };
                        writer.record(&event("GET", path, 200 + worker));
                    }
                });
            }
        });

        let events = read_events(&dir.path().join("requests_2025-10-16.log"));
        assert_eq!(events.len(), 200);
        for worker in 0..8u16 {
            assert_eq!(events.iter().filter(|e| e.status == 200 + worker).count(), 25);
        }
    }
}
