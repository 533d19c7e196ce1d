//! Audit evidence configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::ConfigError;

/// Configuration for the audit evidence pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Whether request evidence is captured at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Evidence root holding the daily stores, sealed artifacts and digests.
    ///
    /// Must exist before the service starts; it is never created.
    #[serde(default = "default_evidence_dir")]
    pub evidence_dir: PathBuf,

    /// Append-only record of rotation activity, kept apart from the evidence.
    #[serde(default = "default_rotation_log")]
    pub rotation_log: PathBuf,

    /// Age in days after which sealed artifacts are purged.
    #[serde(default = "default_log_retention_days")]
    pub log_retention_days: u32,

    /// Age in days after which digests are purged.
    #[serde(default = "default_hash_retention_days")]
    pub hash_retention_days: u32,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            evidence_dir: default_evidence_dir(),
            rotation_log: default_rotation_log(),
            log_retention_days: default_log_retention_days(),
            hash_retention_days: default_hash_retention_days(),
        }
    }
}

impl AuditConfig {
    /// Check the retention horizons.
    ///
    /// Digests outlive the artifacts they describe, so the hash horizon may
    /// never be shorter than the log horizon.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.log_retention_days == 0 || self.hash_retention_days == 0 {
            return Err(ConfigError::Config(
                "audit retention horizons must be at least one day".to_string(),
            ));
        }
        if self.hash_retention_days < self.log_retention_days {
            return Err(ConfigError::Config(format!(
                "audit.hash_retention_days ({}) must be >= audit.log_retention_days ({})",
                self.hash_retention_days, self.log_retention_days
            )));
        }
        Ok(())
    }
}

fn default_enabled() -> bool {
    true
}

fn default_evidence_dir() -> PathBuf {
    PathBuf::from("/evidence/logs")
}

fn default_rotation_log() -> PathBuf {
    PathBuf::from("/evidence/rotation.log")
}

fn default_log_retention_days() -> u32 {
    180
}

fn default_hash_retention_days() -> u32 {
    365
}
