//! Retention enforcer: purges sealed evidence past its horizon.
//!
//! Age is the number of whole days since the file's own modification time.
//! A file is purged only when that age is strictly greater than the horizon,
//! so with a 180-day horizon a 180-day-old artifact survives and a 181-day-old
//! one does not.
//!
//! Purging is unconditional and irreversible. Storage stays bounded at the
//! cost of losing evidence older than the configured horizons; digests get a
//! longer horizon than artifacts so verification history survives the
//! artifacts themselves. Live stores are never purged.

use chrono::{DateTime, Utc};
use scratchpad_core::AuditConfig;
use std::fs;
use std::path::PathBuf;

use crate::diagnostics::Diagnostics;
use crate::layout::{EvidenceEntry, EvidenceKind};

/// Retention horizons, in days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Horizon for sealed artifacts.
    pub log_days: u32,
    /// Horizon for digests.
    pub hash_days: u32,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            log_days: 180,
            hash_days: 365,
        }
    }
}

impl RetentionPolicy {
    pub fn from_config(config: &AuditConfig) -> Self {
        Self {
            log_days: config.log_retention_days,
            hash_days: config.hash_retention_days,
        }
    }

    /// Horizon applying to `kind`, if it is subject to retention at all.
    pub fn horizon(&self, kind: EvidenceKind) -> Option<u32> {
        match kind {
            EvidenceKind::Artifact => Some(self.log_days),
            EvidenceKind::Digest => Some(self.hash_days),
            EvidenceKind::Store => None,
        }
    }
}

/// Whole days elapsed between `modified` and `now`. Negative for future times.
pub fn age_in_days(now: DateTime<Utc>, modified: DateTime<Utc>) -> i64 {
    (now - modified).num_days()
}

/// A file selected for deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Purge {
    pub path: PathBuf,
    pub kind: EvidenceKind,
    pub age_days: i64,
}

/// Select the entries past their horizon.
pub fn plan_purges(now: DateTime<Utc>, entries: &[EvidenceEntry], policy: &RetentionPolicy) -> Vec<Purge> {
    entries
        .iter()
        .filter_map(|entry| {
            let horizon = i64::from(policy.horizon(entry.kind)?);
            let age_days = age_in_days(now, entry.modified);
            (age_days > horizon).then(|| Purge {
                path: entry.path.clone(),
                kind: entry.kind,
                age_days,
            })
        })
        .collect()
}

/// Result of applying a purge list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetentionOutcome {
    pub removed: Vec<PathBuf>,
    pub failed: Vec<PathBuf>,
}

/// Deletes the files a purge plan selects.
pub struct RetentionEnforcer<'a> {
    diagnostics: &'a dyn Diagnostics,
}

impl<'a> RetentionEnforcer<'a> {
    pub fn new(diagnostics: &'a dyn Diagnostics) -> Self {
        Self { diagnostics }
    }

    /// Delete every file in `purges`, continuing past individual failures.
    pub fn enforce(&self, purges: &[Purge]) -> RetentionOutcome {
        let mut outcome = RetentionOutcome::default();
        for purge in purges {
            match fs::remove_file(&purge.path) {
                Ok(()) => {
                    self.diagnostics.info(&format!(
                        "purged {} ({} days old)",
                        purge.path.display(),
                        purge.age_days
                    ));
                    outcome.removed.push(purge.path.clone());
                }
                Err(err) => {
                    self.diagnostics
                        .error(&format!("purge of {} failed: {err}", purge.path.display()));
                    outcome.failed.push(purge.path.clone());
                }
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{MemoryDiagnostics, Severity};
    use chrono::{Duration, NaiveDate, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 3, 0, 0).unwrap()
    }

    fn entry(kind: EvidenceKind, age: Duration) -> EvidenceEntry {
        EvidenceEntry {
            path: PathBuf::from(format!("/evidence/logs/{kind:?}-{}", age.num_hours())),
            kind,
            date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            len: 10,
            modified: now() - age,
        }
    }

    #[test]
    fn test_artifact_horizon_is_strict() {
        let entries = vec![
            entry(EvidenceKind::Artifact, Duration::days(179)),
            entry(EvidenceKind::Artifact, Duration::days(180)),
            entry(EvidenceKind::Artifact, Duration::days(181)),
        ];

        let purges = plan_purges(now(), &entries, &RetentionPolicy::default());

        assert_eq!(purges.len(), 1);
        assert_eq!(purges[0].path, entries[2].path);
        assert_eq!(purges[0].age_days, 181);
    }

    #[test]
    fn test_partial_day_does_not_count() {
        let entries = vec![entry(
            EvidenceKind::Artifact,
            Duration::days(180) + Duration::hours(23),
        )];
        assert!(plan_purges(now(), &entries, &RetentionPolicy::default()).is_empty());
    }

    #[test]
    fn test_digests_use_their_own_horizon() {
        let entries = vec![
            entry(EvidenceKind::Digest, Duration::days(181)),
            entry(EvidenceKind::Digest, Duration::days(365)),
            entry(EvidenceKind::Digest, Duration::days(366)),
        ];

        let purges = plan_purges(now(), &entries, &RetentionPolicy::default());

        assert_eq!(purges.len(), 1);
        assert_eq!(purges[0].kind, EvidenceKind::Digest);
        assert_eq!(purges[0].age_days, 366);
    }

    #[test]
    fn test_stores_are_never_purged() {
        let entries = vec![entry(EvidenceKind::Store, Duration::days(4000))];
        assert!(plan_purges(now(), &entries, &RetentionPolicy::default()).is_empty());
    }

    #[test]
    fn test_future_mtime_is_kept() {
        let entries = vec![entry(EvidenceKind::Artifact, Duration::days(-3))];
        assert!(plan_purges(now(), &entries, &RetentionPolicy::default()).is_empty());
    }

    #[test]
    fn test_enforce_reports_failures_and_continues() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("requests_2025-01-01.log.gz");
        fs::write(&present, b"x").unwrap();
        let absent = dir.path().join("requests_2025-01-02.log.gz");

        let diagnostics = MemoryDiagnostics::new();
        let enforcer = RetentionEnforcer::new(&diagnostics);
        let outcome = enforcer.enforce(&[
            Purge {
                path: absent.clone(),
                kind: EvidenceKind::Artifact,
                age_days: 200,
            },
            Purge {
                path: present.clone(),
                kind: EvidenceKind::Artifact,
                age_days: 200,
            },
        ]);

        assert_eq!(outcome.removed, vec![present.clone()]);
        assert_eq!(outcome.failed, vec![absent]);
        assert!(!present.exists());
        assert_eq!(diagnostics.count(Severity::Error), 1);
    }
}
