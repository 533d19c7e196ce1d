//! Note store: folders and `.txt` notes under a single data root.
//!
//! Every client-supplied path is resolved with [`NoteStore::resolve`], which
//! refuses any `..` component and re-roots absolute paths under the data root.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::ApiError;

/// Extension every note file carries.
pub const NOTE_EXT: &str = ".txt";

/// Longest snapshot logged on save, in characters.
const SNAPSHOT_LIMIT: usize = 200;

/// Shorten `text` for logging.
pub fn truncate_snapshot(text: &str) -> String {
    match text.char_indices().nth(SNAPSHOT_LIMIT) {
        Some((cut, _)) => format!("{} ... [truncated]", &text[..cut]),
        None => text.to_string(),
    }
}

/// Folder tree holding the notes.
#[derive(Debug, Clone)]
pub struct NoteStore {
    root: PathBuf,
}

impl NoteStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a client path onto the data root, or `None` if it would escape it.
    pub fn resolve(&self, requested: &str) -> Option<PathBuf> {
        let mut resolved = self.root.clone();
        for component in Path::new(requested).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::RootDir | Component::CurDir => {}
                Component::ParentDir | Component::Prefix(_) => return None,
            }
        }
        Some(resolved)
    }

    fn resolve_note(&self, requested: &str) -> Option<PathBuf> {
        self.resolve(requested)
            .filter(|path| path != &self.root && path.to_string_lossy().ends_with(NOTE_EXT))
    }

    /// Every folder below the root, as sorted `/`-separated relative paths.
    ///
    /// A missing root is an empty tree.
    pub fn list_folders(&self) -> Result<Vec<String>, ApiError> {
        if !self.root.is_dir() {
            tracing::info!(root = %self.root.display(), "data root missing; no folders");
            return Ok(Vec::new());
        }

        let mut folders = Vec::new();
        let mut pending = vec![self.root.clone()];
        while let Some(dir) = pending.pop() {
            let entries = fs::read_dir(&dir).map_err(|e| ApiError::storage("Internal server error", e))?;
            for entry in entries {
                let entry = entry.map_err(|e| ApiError::storage("Internal server error", e))?;
                let file_type = entry
                    .file_type()
                    .map_err(|e| ApiError::storage("Internal server error", e))?;
                if !file_type.is_dir() {
                    continue;
                }
                let path = entry.path();
                if let Ok(relative) = path.strip_prefix(&self.root) {
                    folders.push(relative_display(relative));
                }
                pending.push(path);
            }
        }

        folders.sort();
        tracing::info!(count = folders.len(), "listed folders");
        Ok(folders)
    }

    /// Create a folder (and any missing parents).
    pub fn create_folder(&self, name: &str) -> Result<PathBuf, ApiError> {
        let path = self.resolve(name).ok_or_else(|| {
            tracing::warn!(name, "rejected unsafe folder name");
            ApiError::InvalidPath("Invalid folder path")
        })?;

        fs::create_dir_all(&path).map_err(|e| ApiError::storage("Internal error", e))?;
        tracing::info!(path = %path.display(), "created folder");
        Ok(path)
    }

    /// Sorted note file names directly inside `folder`.
    pub fn list_files(&self, folder: &str) -> Result<Vec<String>, ApiError> {
        let path = self.resolve(folder).ok_or_else(|| {
            tracing::warn!(folder, "rejected unsafe folder path");
            ApiError::InvalidPath("Invalid folder path")
        })?;

        let entries = match fs::read_dir(&path) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(ApiError::FolderNotFound),
            Err(e) => return Err(ApiError::storage("Internal server error", e)),
        };

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| ApiError::storage("Internal server error", e))?;
            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
            let name = entry.file_name().to_string_lossy().into_owned();
            if is_file && name.ends_with(NOTE_EXT) {
                files.push(name);
            }
        }

        files.sort();
        tracing::info!(count = files.len(), folder = %path.display(), "listed files");
        Ok(files)
    }

    /// Contents of a note.
    pub fn read(&self, requested: &str) -> Result<Vec<u8>, ApiError> {
        let path = self
            .resolve_note(requested)
            .ok_or(ApiError::InvalidPath("Invalid file path"))?;

        let content = fs::read(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ApiError::FileNotFound,
            _ => ApiError::storage("Internal error", e),
        })?;
        tracing::info!(path = %path.display(), "read file");
        Ok(content)
    }

    /// Create or replace a note.
    pub fn save(&self, requested: &str, content: &str) -> Result<PathBuf, ApiError> {
        let path = self.resolve_note(requested).ok_or_else(|| {
            tracing::warn!(path = requested, "rejected unsafe save path");
            ApiError::InvalidPath("Invalid file path")
        })?;

        let before = fs::read_to_string(&path).unwrap_or_default();
        fs::write(&path, content).map_err(|e| ApiError::storage("Write failed", e))?;

        tracing::info!(
            path = %path.display(),
            before = %truncate_snapshot(&before),
            after = %truncate_snapshot(content),
            "saved file"
        );
        Ok(path)
    }

    /// Rename a note.
    pub fn rename(&self, from: &str, to: &str) -> Result<(PathBuf, PathBuf), ApiError> {
        let (Some(source), Some(target)) = (self.resolve_note(from), self.resolve_note(to)) else {
            tracing::warn!(from, to, "rejected unsafe move paths");
            return Err(ApiError::InvalidPath("Invalid file paths"));
        };

        fs::rename(&source, &target).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound if !source.exists() => ApiError::FileNotFound,
            _ => ApiError::storage("Move failed", e),
        })?;
        tracing::info!(from = %source.display(), to = %target.display(), "moved file");
        Ok((source, target))
    }

    /// Delete a note.
    pub fn delete(&self, requested: &str) -> Result<PathBuf, ApiError> {
        let path = self
            .resolve_note(requested)
            .ok_or(ApiError::InvalidPath("Invalid file path"))?;

        fs::remove_file(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ApiError::FileNotFound,
            _ => ApiError::storage("Delete failed", e),
        })?;
        tracing::info!(path = %path.display(), "deleted file");
        Ok(path)
    }
}

fn relative_display(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
