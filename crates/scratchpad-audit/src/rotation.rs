//! Rotation engine: seals a closed day's store into an artifact and digest.
//!
//! A run is split in two:
//!
//! 1. [`plan_rotation`] is a pure function of the current time, the target
//!    date, a listing of the evidence root and the retention policy. It
//!    decides what to do with the target date and which old files to purge.
//! 2. [`RotationEngine`] executes that plan against the filesystem, recording
//!    every step in the rotation activity log.
//!
//! Sealing order is compress → write artifact → hash the artifact as written
//! → write digest → delete the plaintext store. The store is only removed once
//! both sealed files are synced, so evidence always exists in at least one form.

use chrono::{DateTime, NaiveDate, Utc};
use scratchpad_core::AuditConfig;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::diagnostics::{Diagnostics, Severity, TracingDiagnostics};
use crate::error::AuditError;
use crate::event::format_timestamp;
use crate::layout::{EvidenceEntry, EvidenceKind, EvidenceLayout};
use crate::retention::{Purge, RetentionEnforcer, RetentionOutcome, RetentionPolicy, plan_purges};
use crate::seal;

/// Why a rotation had nothing to seal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuietReason {
    /// No store was ever written for the date.
    NoStore,
    /// The store exists but holds no events.
    EmptyStore,
    /// The date was sealed by an earlier run.
    AlreadySealed,
}

impl fmt::Display for QuietReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoStore => write!(f, "no store"),
            Self::EmptyStore => write!(f, "store is empty"),
            Self::AlreadySealed => write!(f, "already sealed"),
        }
    }
}

/// What to do with the target date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SealStep {
    /// Leave everything as is.
    Nothing { reason: QuietReason },
    /// Seal the store into a new artifact and digest.
    Seal {
        store: PathBuf,
        artifact: PathBuf,
        digest: PathBuf,
    },
    /// A previous run wrote the artifact but stopped before removing the store.
    Resume {
        store: PathBuf,
        artifact: PathBuf,
        digest: PathBuf,
        digest_present: bool,
    },
    /// The files for the date cannot be reconciled automatically.
    Conflict { detail: String },
}

/// Everything a rotation run will do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationPlan {
    pub target: NaiveDate,
    pub seal: SealStep,
    pub purges: Vec<Purge>,
}

/// Decide what a rotation run for `target` does, given a listing of the root.
pub fn plan_rotation(
    now: DateTime<Utc>,
    target: NaiveDate,
    layout: &EvidenceLayout,
    entries: &[EvidenceEntry],
    policy: &RetentionPolicy,
) -> RotationPlan {
    let find = |kind: EvidenceKind| entries.iter().find(|e| e.date == target && e.kind == kind);
    let store = find(EvidenceKind::Store);
    let artifact = find(EvidenceKind::Artifact);
    let digest = find(EvidenceKind::Digest);

    let seal = match (store, artifact, digest) {
        (None, Some(_), _) => SealStep::Nothing {
            reason: QuietReason::AlreadySealed,
        },
        (None, None, _) => SealStep::Nothing {
            reason: QuietReason::NoStore,
        },
        (Some(store), _, _) if store.len == 0 => SealStep::Nothing {
            reason: QuietReason::EmptyStore,
        },
        (Some(_), None, None) => SealStep::Seal {
            store: layout.store_path(target),
            artifact: layout.artifact_path(target),
            digest: layout.digest_path(target),
        },
        (Some(_), Some(_), digest) => SealStep::Resume {
            store: layout.store_path(target),
            artifact: layout.artifact_path(target),
            digest: layout.digest_path(target),
            digest_present: digest.is_some(),
        },
        (Some(_), None, Some(_)) => SealStep::Conflict {
            detail: "a digest exists without its artifact".to_string(),
        },
    };

    // Files for the date being sealed are never purged in the same run.
    let candidates: Vec<EvidenceEntry> = entries
        .iter()
        .filter(|e| e.date != target)
        .cloned()
        .collect();
    let purges = plan_purges(now, &candidates, policy);

    RotationPlan {
        target,
        seal,
        purges,
    }
}

/// What happened to the target date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SealOutcome {
    NothingToRotate(QuietReason),
    Sealed { artifact: PathBuf, digest: String },
    Resumed { artifact: PathBuf, digest: String },
}

/// Summary of a rotation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationReport {
    pub target: NaiveDate,
    pub outcome: SealOutcome,
    pub retention: RetentionOutcome,
}

impl fmt::Display for RotationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            SealOutcome::NothingToRotate(reason) => {
                write!(f, "{}: nothing to rotate ({reason})", self.target)?
            }
            SealOutcome::Sealed { artifact, digest } => write!(
                f,
                "{}: sealed {} sha512={digest}",
                self.target,
                artifact.display()
            )?,
            SealOutcome::Resumed { artifact, digest } => write!(
                f,
                "{}: completed interrupted seal of {} sha512={digest}",
                self.target,
                artifact.display()
            )?,
        }
        write!(
            f,
            "; purged {} file(s), {} purge failure(s)",
            self.retention.removed.len(),
            self.retention.failed.len()
        )
    }
}

/// Append-only record of rotation activity, kept apart from the evidence.
///
/// Every line is also forwarded to the wrapped diagnostics sink.
pub struct ActivityLog {
    path: PathBuf,
    clock: Arc<dyn Clock>,
    forward: Arc<dyn Diagnostics>,
}

impl ActivityLog {
    pub fn new(path: impl Into<PathBuf>, clock: Arc<dyn Clock>, forward: Arc<dyn Diagnostics>) -> Self {
        Self {
            path: path.into(),
            clock,
            forward,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, line: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(line.as_bytes())?;
        file.sync_data()
    }
}

impl Diagnostics for ActivityLog {
    fn emit(&self, severity: Severity, message: &str) {
        self.forward.emit(severity, message);

        let line = format!("[{severity}] {} {message}\n", format_timestamp(self.clock.now()));
        if let Err(err) = self.append(&line) {
            self.forward.warn(&format!(
                "rotation activity log {} not writable: {err}",
                self.path.display()
            ));
        }
    }
}

/// Seals closed days and enforces retention.
pub struct RotationEngine {
    layout: EvidenceLayout,
    activity: ActivityLog,
    policy: RetentionPolicy,
    clock: Arc<dyn Clock>,
}

impl RotationEngine {
    pub fn new(
        root: impl Into<PathBuf>,
        activity_log: impl Into<PathBuf>,
        policy: RetentionPolicy,
        clock: Arc<dyn Clock>,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> Self {
        Self {
            layout: EvidenceLayout::new(root),
            activity: ActivityLog::new(activity_log, clock.clone(), diagnostics),
            policy,
            clock,
        }
    }

    /// Create an engine from configuration, using the wall clock and tracing.
    pub fn from_config(config: &AuditConfig) -> Self {
        Self::new(
            &config.evidence_dir,
            &config.rotation_log,
            RetentionPolicy::from_config(config),
            Arc::new(SystemClock),
            Arc::new(TracingDiagnostics),
        )
    }

    pub fn layout(&self) -> &EvidenceLayout {
        &self.layout
    }

    pub fn policy(&self) -> RetentionPolicy {
        self.policy
    }

    /// Seal yesterday's store (UTC), then enforce retention.
    pub fn rotate(&self) -> Result<RotationReport, AuditError> {
        self.rotate_date(self.clock.yesterday())
    }

    /// Seal the store for `target`, then enforce retention.
    ///
    /// `target` must be a closed day: today's store is still being written.
    pub fn rotate_date(&self, target: NaiveDate) -> Result<RotationReport, AuditError> {
        let plan = match self.plan(target) {
            Ok(plan) => plan,
            Err(err) => {
                self.activity.error(&format!("rotation skipped for {target}: {err}"));
                return Err(err);
            }
        };

        self.activity.info(&format!(
            "rotation started for {target} in {}",
            self.layout.root().display()
        ));
        self.clear_partials(target);

        let outcome = match self.apply(target, &plan.seal) {
            Ok(outcome) => outcome,
            Err(err) => {
                self.activity.error(&format!("rotation aborted for {target}: {err}"));
                return Err(err);
            }
        };

        let retention = RetentionEnforcer::new(&self.activity).enforce(&plan.purges);

        let report = RotationReport {
            target,
            outcome,
            retention,
        };
        self.activity.info(&format!("rotation complete for {report}"));
        Ok(report)
    }

    /// Compute the plan for `target` without touching any file.
    pub fn plan(&self, target: NaiveDate) -> Result<RotationPlan, AuditError> {
        if target >= self.clock.today() {
            return Err(AuditError::StoreStillOpen { date: target });
        }
        let entries = self.layout.scan()?;
        Ok(plan_rotation(
            self.clock.now(),
            target,
            &self.layout,
            &entries,
            &self.policy,
        ))
    }

    /// Check the sealed artifact for `date` against its digest.
    pub fn verify(&self, date: NaiveDate) -> Result<String, AuditError> {
        self.layout.ensure_available()?;
        seal::verify_artifact(&self.layout.artifact_path(date), &self.layout.digest_path(date))
    }

    fn apply(&self, target: NaiveDate, step: &SealStep) -> Result<SealOutcome, AuditError> {
        match step {
            SealStep::Nothing { reason } => {
                self.activity
                    .info(&format!("nothing to rotate for {target}: {reason}"));
                if *reason == QuietReason::EmptyStore {
                    self.remove_empty_store(target);
                }
                Ok(SealOutcome::NothingToRotate(*reason))
            }
            SealStep::Seal {
                store,
                artifact,
                digest,
            } => {
                let hex = self.seal(store, artifact, digest)?;
                self.activity.info(&format!(
                    "archived {} -> {} sha512={hex}",
                    store.display(),
                    artifact.display()
                ));
                Ok(SealOutcome::Sealed {
                    artifact: artifact.clone(),
                    digest: hex,
                })
            }
            SealStep::Resume {
                store,
                artifact,
                digest,
                digest_present,
            } => {
                let hex = self.resume(target, store, artifact, digest, *digest_present)?;
                self.activity.info(&format!(
                    "completed interrupted rotation {} -> {} sha512={hex}",
                    store.display(),
                    artifact.display()
                ));
                Ok(SealOutcome::Resumed {
                    artifact: artifact.clone(),
                    digest: hex,
                })
            }
            SealStep::Conflict { detail } => Err(AuditError::SealConflict {
                date: target,
                detail: detail.clone(),
            }),
        }
    }

    fn seal(&self, store: &Path, artifact: &Path, digest: &Path) -> Result<String, AuditError> {
        seal::compress_file_durably(store, artifact).map_err(|source| {
            AuditError::CompressionFailed {
                path: artifact.to_path_buf(),
                source,
            }
        })?;

        let hex = seal::sha512_file(artifact).map_err(|e| AuditError::io(artifact, e))?;
        write_digest(artifact, digest, &hex)?;

        fs::remove_file(store).map_err(|e| AuditError::io(store, e))?;
        Ok(hex)
    }

    fn resume(
        &self,
        target: NaiveDate,
        store: &Path,
        artifact: &Path,
        digest: &Path,
        digest_present: bool,
    ) -> Result<String, AuditError> {
        let plain = seal::sha512_file(store).map_err(|e| AuditError::io(store, e))?;
        let inflated = seal::sha512_inflated(artifact).map_err(|e| AuditError::SealConflict {
            date: target,
            detail: format!("existing artifact {} is unreadable: {e}", artifact.display()),
        })?;
        if inflated != plain {
            return Err(AuditError::SealConflict {
                date: target,
                detail: format!(
                    "existing artifact {} does not match {}",
                    artifact.display(),
                    store.display()
                ),
            });
        }

        let hex = if digest_present {
            seal::verify_artifact(artifact, digest)?
        } else {
            let hex = seal::sha512_file(artifact).map_err(|e| AuditError::io(artifact, e))?;
            write_digest(artifact, digest, &hex)?;
            hex
        };

        fs::remove_file(store).map_err(|e| AuditError::io(store, e))?;
        Ok(hex)
    }

    /// Remove seal writes left behind by interrupted runs for `target` and earlier days.
    fn clear_partials(&self, target: NaiveDate) {
        let partials = match self.layout.scan_partials() {
            Ok(partials) => partials,
            Err(err) => {
                self.activity.warn(&format!("could not list partial writes: {err}"));
                return;
            }
        };
        for (path, _) in partials.into_iter().filter(|(_, date)| *date <= target) {
            match fs::remove_file(&path) {
                Ok(()) => self
                    .activity
                    .warn(&format!("removed abandoned partial write {}", path.display())),
                Err(err) => self.activity.warn(&format!(
                    "could not remove partial write {}: {err}",
                    path.display()
                )),
            }
        }
    }

    /// A closed day with a zero-byte store has nothing to seal; drop the store.
    fn remove_empty_store(&self, target: NaiveDate) {
        let store = self.layout.store_path(target);
        let still_empty = fs::metadata(&store).is_ok_and(|m| m.is_file() && m.len() == 0);
        if !still_empty {
            return;
        }
        match fs::remove_file(&store) {
            Ok(()) => self
                .activity
                .info(&format!("removed empty store {}", store.display())),
            Err(err) => self.activity.warn(&format!(
                "could not remove empty store {}: {err}",
                store.display()
            )),
        }
    }
}

fn write_digest(artifact: &Path, digest: &Path, hex: &str) -> Result<(), AuditError> {
    let name = artifact
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    seal::write_new_durably(digest, seal::digest_line(hex, &name).as_bytes()).map_err(|source| {
        AuditError::DigestFailed {
            path: digest.to_path_buf(),
            source,
        }
    })
}
