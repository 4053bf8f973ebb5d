use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Single-file staging area.
///
/// Bytes are written to [`Workspace::path`] and only become visible at the
/// destination on [`Workspace::commit`]. An uncommitted staging file is removed
/// on drop unless the workspace was marked [`Workspace::keep_partial`], which the
/// resumable downloader uses to pick up where an interrupted transfer stopped.
pub struct Workspace {
    staging_path:     PathBuf,
    destination_path: PathBuf,
    keep_partial:     bool,
    committed:        bool,
}

impl Workspace {
    pub fn new(staging_dir: impl AsRef<Path>, destination: impl AsRef<Path>) -> Result<Self> {
        let staging_dir = staging_dir.as_ref();
        let destination_path = destination.as_ref().to_path_buf();
        let file_name = destination_path
            .file_name()
            .ok_or_else(|| Error::NoParent(destination_path.clone()))?;

        crate::ensure_dir(staging_dir)?;

        let mut staged = file_name.to_os_string();
        staged.push(".part");

        Ok(Self {
            staging_path: staging_dir.join(staged),
            destination_path,
            keep_partial: false,
            committed: false,
        })
    }

    /// Leave the staging file in place if the workspace is dropped uncommitted.
    pub fn keep_partial(mut self, keep: bool) -> Self {
        self.keep_partial = keep;
        self
    }

    pub fn path(&self) -> &Path {
        &self.staging_path
    }

    pub fn destination(&self) -> &Path {
        &self.destination_path
    }

    /// Bytes already staged by an earlier attempt.
    pub fn staged_len(&self) -> Result<u64> {
        Ok(crate::file_size(&self.staging_path)?.unwrap_or(0))
    }

    /// Discard anything staged so far.
    pub fn reset(&self) -> Result<()> {
        match std::fs::remove_file(&self.staging_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(Error::Write {
                path: self.staging_path.clone(),
                source,
            }),
        }
    }

    /// Move the staged file to its destination.
    pub fn commit(mut self) -> Result<PathBuf> {
        if !self.staging_path.is_file() {
            return Err(Error::StagingMissing(self.staging_path.clone()));
        }
        if let Some(parent) = self.destination_path.parent() {
            crate::ensure_dir(parent)?;
        }

        std::fs::rename(&self.staging_path, &self.destination_path).map_err(|source| {
            Error::Write {
                path: self.destination_path.clone(),
                source,
            }
        })?;
        self.committed = true;
        tracing::debug!(path = %self.destination_path.display(), "committed staged file");
        Ok(self.destination_path.clone())
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if !self.committed && !self.keep_partial {
            let _ = std::fs::remove_file(&self.staging_path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_workspace_commit() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("models").join("heart.glb");
        let ws = Workspace::new(dir.path().join(".staging"), &dest).unwrap();
        std::fs::write(ws.path(), b"glTF").unwrap();
        assert_eq!(ws.commit().unwrap(), dest);
        assert_eq!(std::fs::read(&dest).unwrap(), b"glTF");
    }

    #[test]
    fn test_workspace_cleanup_on_drop() {
        let dir = tempdir().unwrap();
        let staged = {
            let ws = Workspace::new(dir.path().join(".staging"), dir.path().join("a.glb")).unwrap();
            std::fs::write(ws.path(), b"partial").unwrap();
            ws.path().to_path_buf()
        };
        assert!(!staged.exists());
    }

    #[test]
    fn test_workspace_keep_partial() {
        let dir = tempdir().unwrap();
        let staging = dir.path().join(".staging");
        let dest = dir.path().join("a.glb");
        {
            let ws = Workspace::new(&staging, &dest).unwrap().keep_partial(true);
            std::fs::write(ws.path(), b"part").unwrap();
        }
        let ws = Workspace::new(&staging, &dest).unwrap();
        assert_eq!(ws.staged_len().unwrap(), 4);
        ws.reset().unwrap();
        assert_eq!(ws.staged_len().unwrap(), 0);
    }

    #[test]
    fn test_commit_without_staged_file_fails() {
        let dir = tempdir().unwrap();
        let ws = Workspace::new(dir.path().join(".staging"), dir.path().join("a.glb")).unwrap();
        assert!(matches!(ws.commit(), Err(Error::StagingMissing(_))));
    }
}
