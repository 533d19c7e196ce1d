//! Server application state.

use scratchpad_audit::{Clock, EventWriter, SystemClock};
use scratchpad_core::ScratchpadConfig;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::notes::NoteStore;

/// Shared application state for the router.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    notes: NoteStore,
    static_dir: PathBuf,
    audit: Arc<EventWriter>,
    clock: Arc<dyn Clock>,
}

impl AppState {
    /// Create state from its parts.
    ///
    /// `clock` stamps captured requests; give the writer the same clock so an
    /// event always lands in the store for its own start date.
    pub fn new(
        notes: NoteStore,
        static_dir: impl Into<PathBuf>,
        audit: Arc<EventWriter>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                notes,
                static_dir: static_dir.into(),
                audit,
                clock,
            }),
        }
    }

    /// Create state from configuration, using the wall clock.
    pub fn from_config(config: &ScratchpadConfig) -> Self {
        Self::new(
            NoteStore::new(&config.server.data_root),
            &config.server.static_dir,
            Arc::new(EventWriter::from_config(&config.audit)),
            Arc::new(SystemClock),
        )
    }

    pub fn notes(&self) -> &NoteStore {
        &self.inner.notes
    }

    pub fn static_dir(&self) -> &Path {
        &self.inner.static_dir
    }

    /// The evidence writer.
    pub fn audit(&self) -> Arc<EventWriter> {
        self.inner.audit.clone()
    }

    pub fn clock(&self) -> &dyn Clock {
        self.inner.clock.as_ref()
    }
}
