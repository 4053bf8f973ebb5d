//! Filesystem primitives shared by the asset cache and the session store.
//!
//! Everything here is synchronous and small: directory creation, size probes,
//! atomic whole-file writes and a single-file staging [`Workspace`].

mod error;
mod workspace;

pub use error::{Error, Result};
pub use workspace::Workspace;

use std::io::{ErrorKind, Write};
use std::path::Path;

/// Create `path` and all missing parents.
///
/// Returns `true` when the directory did not exist before the call.
pub fn ensure_dir(path: impl AsRef<Path>) -> Result<bool> {
    let path = path.as_ref();
    if path.is_dir() {
        return Ok(false);
    }

    std::fs::create_dir_all(path).map_err(|source| Error::CreateDir {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "created directory");
    Ok(true)
}

/// Size of the regular file at `path`, or `None` if nothing is there.
pub fn file_size(path: impl AsRef<Path>) -> Result<Option<u64>> {
    let path = path.as_ref();
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => Ok(Some(meta.len())),
        Ok(_) => Ok(None),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(Error::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// `true` when `path` is a regular file with at least one byte.
pub fn is_nonempty_file(path: impl AsRef<Path>) -> bool {
    matches!(file_size(path), Ok(Some(len)) if len > 0)
}

/// Replace the contents of `path` in one rename.
///
/// The bytes are written to a temporary sibling first, so readers observe
/// either the old file or the new one, never a torn write.
pub fn atomic_write(path: impl AsRef<Path>, content: &[u8]) -> Result<()> {
    let path = path.as_ref();
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .ok_or_else(|| Error::NoParent(path.to_path_buf()))?;
    ensure_dir(parent)?;

    let write_err = |source| Error::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut tmp = tempfile::Builder::new()
        .prefix(".tmp.")
        .suffix(".modelsight")
        .tempfile_in(parent)
        .map_err(write_err)?;
    tmp.write_all(content).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;

    Ok(())
}

pub fn atomic_read(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = path.as_ref();
    std::fs::read(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })
}
