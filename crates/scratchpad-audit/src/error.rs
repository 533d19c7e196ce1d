//! Error types for the audit crate.

use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur in the evidence pipeline.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The evidence root is missing or is not a directory.
    #[error("audit path missing or invalid: {}", path.display())]
    EvidenceRootUnavailable { path: PathBuf },

    /// Appending a record to the daily store failed.
    #[error("audit append to {} failed: {source}", path.display())]
    AppendFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Compressing a store into its sealed artifact failed.
    #[error("compression of {} failed: {source}", path.display())]
    CompressionFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Persisting a digest failed.
    #[error("writing digest {} failed: {source}", path.display())]
    DigestFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Any other filesystem error, with the path it concerned.
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The requested date's store may still receive writes.
    #[error("refusing to rotate {date}: its store is still open for writing")]
    StoreStillOpen { date: NaiveDate },

    /// Leftover files for a date do not form a consistent pair.
    #[error("inconsistent evidence for {date}: {detail}")]
    SealConflict { date: NaiveDate, detail: String },

    /// No sealed artifact exists for a date.
    #[error("no sealed artifact at {}", path.display())]
    ArtifactMissing { path: PathBuf },

    /// A digest file could not be parsed.
    #[error("malformed digest file {}", path.display())]
    MalformedDigest { path: PathBuf },

    /// A sealed artifact no longer matches its digest.
    #[error("digest mismatch for {}: recorded {recorded}, computed {computed}", path.display())]
    DigestMismatch {
        path: PathBuf,
        recorded: String,
        computed: String,
    },

    /// Serialization error.
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl AuditError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
