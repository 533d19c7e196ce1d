//! # scratchpad-audit
//!
//! Audit evidence pipeline for the scratchpad note service.
//!
//! This crate provides functionality for:
//! - Recording one evidence line per completed HTTP request
//! - Partitioning evidence into one append-only store per UTC day
//! - Sealing closed days into gzip artifacts with SHA-512 digests
//! - Purging sealed evidence past its retention horizon
//!
//! ## Evidence Format
//!
//! Stores hold JSON Lines, one object per request:
//!
//! ```text
//! {"timestamp":"2025-10-16T09:12:03Z","method":"POST","path":"/folders","remote_identity":"10.0.0.7:51234","status":201,"duration":4}
//! ```
//!
//! ## Evidence Files
//!
//! | File | Written by | Removed by |
//! |------|------------|------------|
//! | `requests_D.log` | [`EventWriter`] | [`RotationEngine`], once sealed |
//! | `requests_D.log.gz` | [`RotationEngine`] | retention, after the log horizon |
//! | `requests_D.log.gz.sha512` | [`RotationEngine`] | retention, after the hash horizon |
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use scratchpad_audit::{AuditEvent, EventWriter, RotationEngine};
//! use scratchpad_core::AuditConfig;
//!
//! let config = AuditConfig::default();
//!
//! let writer = EventWriter::from_config(&config);
//! writer.record(
//!     &AuditEvent::builder(chrono::Utc::now(), "GET", "/folders")
//!         .remote_identity("127.0.0.1:50000")
//!         .status(200)
//!         .duration_ms(2)
//!         .build(),
//! );
//!
//! let report = RotationEngine::from_config(&config).rotate()?;
//! println!("{report}");
//! # Ok::<(), scratchpad_audit::AuditError>(())
//! ```

pub mod clock;
pub mod diagnostics;
pub mod error;
pub mod event;
pub mod layout;
pub mod retention;
pub mod rotation;
pub mod seal;
pub mod writer;

pub use clock::{Clock, FixedClock, SystemClock};
pub use diagnostics::{Diagnostics, MemoryDiagnostics, NullDiagnostics, Severity, TracingDiagnostics};
pub use error::AuditError;
pub use event::{AuditEvent, AuditEventBuilder};
pub use layout::{EvidenceEntry, EvidenceKind, EvidenceLayout};
pub use retention::{RetentionEnforcer, RetentionOutcome, RetentionPolicy};
pub use rotation::{
    ActivityLog, QuietReason, RotationEngine, RotationPlan, RotationReport, SealOutcome, SealStep,
    plan_rotation,
};
pub use writer::{CaptureHealth, EventWriter};
