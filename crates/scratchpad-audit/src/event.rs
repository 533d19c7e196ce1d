//! Audit event types.
//!
//! One [`AuditEvent`] is captured per completed API request and persisted as a
//! single JSON line in the day's evidence store.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Textual profile for evidence timestamps (UTC, second precision).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Format a timestamp with the evidence profile.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// A completed API request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// When the request started.
    #[serde(with = "utc_seconds")]
    pub timestamp: DateTime<Utc>,

    /// Request verb (e.g., "GET").
    pub method: String,

    /// Request route, not a file-system path.
    pub path: String,

    /// Caller address.
    pub remote_identity: String,

    /// Response status code.
    pub status: u16,

    /// Elapsed wall-clock time in whole milliseconds.
    #[serde(rename = "duration")]
    pub duration_ms: u64,
}

impl AuditEvent {
    /// Create a builder for an event started at `timestamp`.
    pub fn builder(
        timestamp: DateTime<Utc>,
        method: impl Into<String>,
        path: impl Into<String>,
    ) -> AuditEventBuilder {
        AuditEventBuilder::new(timestamp, method, path)
    }

    /// Serialize as one self-delimited evidence line, newline included.
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }

    /// Parse one evidence line.
    pub fn from_json_line(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line.trim_end_matches('\n'))
    }
}

/// Human-readable form: `[timestamp] METHOD path status=.. duration_ms=.. remote=..`
impl fmt::Display for AuditEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {} status={} duration_ms={} remote={}",
            format_timestamp(self.timestamp),
            self.method,
            self.path,
            self.status,
            self.duration_ms,
            self.remote_identity,
        )
    }
}

/// Builder for creating audit events.
#[derive(Debug)]
pub struct AuditEventBuilder {
    event: AuditEvent,
}

impl AuditEventBuilder {
    /// Create a new builder with the request line.
    ///
    /// Status defaults to 200, duration to zero and the caller to "unknown".
    pub fn new(timestamp: DateTime<Utc>, method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            event: AuditEvent {
                timestamp: timestamp.trunc_subsecs(0),
                method: method.into(),
                path: path.into(),
                remote_identity: "unknown".to_string(),
                status: 200,
                duration_ms: 0,
            },
        }
    }

    /// Set the caller address.
    pub fn remote_identity(mut self, remote: impl Into<String>) -> Self {
        self.event.remote_identity = remote.into();
        self
    }

    /// Set the response status.
    pub fn status(mut self, status: u16) -> Self {
        self.event.status = status;
        self
    }

    /// Set the duration in milliseconds.
    pub fn duration_ms(mut self, duration: u64) -> Self {
        self.event.duration_ms = duration;
        self
    }

    /// Build the event.
    pub fn build(self) -> AuditEvent {
        self.event
    }
}

mod utc_seconds {
    use super::TIMESTAMP_FORMAT;
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&at.format(TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT)
            .map(|naive| naive.and_utc())
            .map_err(serde::de::Error::custom)
    }
}
