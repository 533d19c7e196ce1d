//! Evidence root layout.
//!
//! Every file under the evidence root is named from a UTC date key:
//!
//! | Kind | Name |
//! |------|------|
//! | Store | `requests_YYYY-MM-DD.log` |
//! | Artifact | `requests_YYYY-MM-DD.log.gz` |
//! | Digest | `requests_YYYY-MM-DD.log.gz.sha512` |
//!
//! Anything else in the directory (partial writes, operator notes) is ignored
//! by [`EvidenceLayout::scan`]. Partial seal writes are listed separately by
//! [`EvidenceLayout::scan_partials`].

use chrono::{DateTime, NaiveDate, Utc};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::AuditError;
use crate::seal;

const PREFIX: &str = "requests_";
const STORE_EXT: &str = ".log";
const ARTIFACT_EXT: &str = ".log.gz";
const DIGEST_EXT: &str = ".log.gz.sha512";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Name of the store that receives events written at `now`.
pub fn store_name_for(now: DateTime<Utc>) -> String {
    store_name(now.date_naive())
}

/// Name of the live store for `date`.
pub fn store_name(date: NaiveDate) -> String {
    format!("{PREFIX}{}{STORE_EXT}", date.format(DATE_FORMAT))
}

/// Name of the sealed artifact for `date`.
pub fn artifact_name(date: NaiveDate) -> String {
    format!("{PREFIX}{}{ARTIFACT_EXT}", date.format(DATE_FORMAT))
}

/// Name of the digest for `date`.
pub fn digest_name(date: NaiveDate) -> String {
    format!("{PREFIX}{}{DIGEST_EXT}", date.format(DATE_FORMAT))
}

/// Kind of file found under the evidence root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EvidenceKind {
    Store,
    Artifact,
    Digest,
}

/// Recognise an evidence file name.
pub fn classify(file_name: &str) -> Option<(EvidenceKind, NaiveDate)> {
    let rest = file_name.strip_prefix(PREFIX)?;
    // Longest extension first: every digest name also ends in ".log.gz...".
    let (kind, date) = if let Some(date) = rest.strip_suffix(DIGEST_EXT) {
        (EvidenceKind::Digest, date)
    } else if let Some(date) = rest.strip_suffix(ARTIFACT_EXT) {
        (EvidenceKind::Artifact, date)
    } else if let Some(date) = rest.strip_suffix(STORE_EXT) {
        (EvidenceKind::Store, date)
    } else {
        return None;
    };

    let parsed = NaiveDate::parse_from_str(date, DATE_FORMAT).ok()?;
    (parsed.format(DATE_FORMAT).to_string() == date).then_some((kind, parsed))
}

/// One evidence file with the metadata rotation and retention need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvidenceEntry {
    pub path: PathBuf,
    pub kind: EvidenceKind,
    pub date: NaiveDate,
    pub len: u64,
    pub modified: DateTime<Utc>,
}

/// The evidence root directory.
#[derive(Debug, Clone)]
pub struct EvidenceLayout {
    root: PathBuf,
}

impl EvidenceLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn store_path(&self, date: NaiveDate) -> PathBuf {
        self.root.join(store_name(date))
    }

    pub fn artifact_path(&self, date: NaiveDate) -> PathBuf {
        self.root.join(artifact_name(date))
    }

    pub fn digest_path(&self, date: NaiveDate) -> PathBuf {
        self.root.join(digest_name(date))
    }

    /// Fail unless the root exists and is a directory. Never creates it.
    pub fn ensure_available(&self) -> Result<(), AuditError> {
        match fs::metadata(&self.root) {
            Ok(meta) if meta.is_dir() => Ok(()),
            _ => Err(AuditError::EvidenceRootUnavailable {
                path: self.root.clone(),
            }),
        }
    }

    /// List every recognised evidence file, sorted by date then kind.
    pub fn scan(&self) -> Result<Vec<EvidenceEntry>, AuditError> {
        self.ensure_available()?;

        let mut entries = Vec::new();
        let dir = fs::read_dir(&self.root).map_err(|e| AuditError::io(&self.root, e))?;
        for entry in dir {
            let entry = entry.map_err(|e| AuditError::io(&self.root, e))?;
            let name = entry.file_name();
            let Some((kind, date)) = name.to_str().and_then(classify) else {
                continue;
            };

            let path = entry.path();
            let meta = entry.metadata().map_err(|e| AuditError::io(&path, e))?;
            if !meta.is_file() {
                continue;
            }
            let modified = meta.modified().map_err(|e| AuditError::io(&path, e))?;

            entries.push(EvidenceEntry {
                path,
                kind,
                date,
                len: meta.len(),
                modified: DateTime::<Utc>::from(modified),
            });
        }

        entries.sort_by(|a, b| (a.date, a.kind).cmp(&(b.date, b.kind)));
        Ok(entries)
    }

    /// List in-progress seal writes (`<artifact or digest>.partial`) with their date.
    pub fn scan_partials(&self) -> Result<Vec<(PathBuf, NaiveDate)>, AuditError> {
        self.ensure_available()?;

        let mut partials = Vec::new();
        let dir = fs::read_dir(&self.root).map_err(|e| AuditError::io(&self.root, e))?;
        for entry in dir {
            let entry = entry.map_err(|e| AuditError::io(&self.root, e))?;
            let name = entry.file_name();
            let Some((kind, date)) = name
                .to_str()
                .and_then(seal::strip_partial)
                .and_then(classify)
            else {
                continue;
            };
            if kind == EvidenceKind::Store || !entry.file_type().is_ok_and(|t| t.is_file()) {
                continue;
            }
            partials.push((entry.path(), date));
        }

        partials.sort();
        Ok(partials)
    }
}
