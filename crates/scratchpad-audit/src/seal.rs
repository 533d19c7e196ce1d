//! Sealing primitives: gzip compression, SHA-512 digests and durable writes.
//!
//! File-level helpers stream their input, so sealing a busy day does not
//! hold the whole store in memory.
//!
//! Digest files use the `sha512sum` line format so operators can check an
//! artifact with standard tools:
//!
//! ```text
//! <128 hex chars>  requests_2025-10-16.log.gz
//! ```

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use sha2::{Digest, Sha512};
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use crate::error::AuditError;

const PARTIAL_SUFFIX: &str = ".partial";

/// Hex-encoded SHA-512 of `bytes`.
pub fn sha512_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha512::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Gzip `bytes`. The header carries no timestamp, so output is deterministic.
pub fn compress(bytes: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(bytes)?;
    encoder.finish()
}

/// Inflate a gzip stream.
pub fn decompress(bytes: &[u8]) -> io::Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(bytes);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

/// Render a digest line for `artifact_name`.
pub fn digest_line(hex_digest: &str, artifact_name: &str) -> String {
    format!("{hex_digest}  {artifact_name}\n")
}

/// Parse a digest line into `(hex digest, artifact name)`.
pub fn parse_digest_line(content: &str) -> Option<(String, String)> {
    let line = content.lines().next()?;
    let (digest, name) = line.split_once("  ")?;
    let valid = digest.len() == 128 && digest.bytes().all(|b| b.is_ascii_hexdigit());
    (valid && !name.is_empty()).then(|| (digest.to_ascii_lowercase(), name.to_string()))
}

/// Hex-encoded SHA-512 of the file at `path`, read as a stream.
pub fn sha512_file(path: &Path) -> io::Result<String> {
    let mut hasher = Sha512::new();
    io::copy(&mut File::open(path)?, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

/// Hex-encoded SHA-512 of the inflated content of the gzip file at `path`.
pub fn sha512_inflated(path: &Path) -> io::Result<String> {
    let mut hasher = Sha512::new();
    io::copy(&mut GzDecoder::new(File::open(path)?), &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

/// Gzip the file at `src` into a new file at `dest`, streaming both sides.
///
/// Same placement rules as [`write_new_durably`].
pub fn compress_file_durably(src: &Path, dest: &Path) -> io::Result<()> {
    let mut input = File::open(src)?;
    write_new_with(dest, |file| {
        let mut encoder = GzEncoder::new(file, Compression::best());
        io::copy(&mut input, &mut encoder)?;
        encoder.finish()?;
        Ok(())
    })
}

/// Write `bytes` to `path` without ever exposing a partial file under `path`.
///
/// The data goes to a sibling `.partial` file, is synced, and is linked into
/// place. An existing file at `path` is never replaced, even by a concurrent
/// writer. The parent directory is synced before returning.
pub fn write_new_durably(path: &Path, bytes: &[u8]) -> io::Result<()> {
    write_new_with(path, |file| file.write_all(bytes))
}

fn write_new_with<F>(path: &Path, fill: F) -> io::Result<()>
where
    F: FnOnce(&mut File) -> io::Result<()>,
{
    let partial = partial_path(path);
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&partial)
        .map_err(|e| match e.kind() {
            io::ErrorKind::AlreadyExists => io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} is held by another writer", partial.display()),
            ),
            _ => e,
        })?;

    let result = fill(&mut file)
        .and_then(|()| file.sync_all())
        // hard_link refuses an existing target atomically; rename would replace it.
        .and_then(|()| fs::hard_link(&partial, path));
    drop(file);

    let _ = fs::remove_file(&partial);
    result?;
    sync_parent(path)
}

fn sync_parent(path: &Path) -> io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    File::open(parent)?.sync_all()
}

/// Sibling path used while `path` is being written.
pub fn partial_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(PARTIAL_SUFFIX);
    PathBuf::from(name)
}

/// Strip the in-progress suffix from a file name, if present.
pub fn strip_partial(file_name: &str) -> Option<&str> {
    file_name.strip_suffix(PARTIAL_SUFFIX)
}

/// Recompute the SHA-512 of `artifact` and compare it with `digest_file`.
///
/// Returns the verified hex digest.
pub fn verify_artifact(artifact: &Path, digest_file: &Path) -> Result<String, AuditError> {
    if !artifact.is_file() {
        return Err(AuditError::ArtifactMissing {
            path: artifact.to_path_buf(),
        });
    }

    let content = fs::read_to_string(digest_file).map_err(|e| AuditError::io(digest_file, e))?;
    let (recorded, name) = parse_digest_line(&content).ok_or_else(|| AuditError::MalformedDigest {
        path: digest_file.to_path_buf(),
    })?;

    let expected_name = artifact.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    if name != expected_name {
        return Err(AuditError::MalformedDigest {
            path: digest_file.to_path_buf(),
        });
    }

    let computed = sha512_file(artifact).map_err(|e| AuditError::io(artifact, e))?;
    if computed != recorded {
        return Err(AuditError::DigestMismatch {
            path: artifact.to_path_buf(),
            recorded,
            computed,
        });
    }
    Ok(computed)
}
