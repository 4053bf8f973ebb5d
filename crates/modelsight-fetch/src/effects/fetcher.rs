use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use modelsight_fs::Workspace;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::core::ProgressGate;
use crate::data::{FetchOptions, FetchPhase, Progress};
use crate::effects::http::{HttpClient, RemoteBody};
use crate::error::{DownloadCause, Error, Result};

/// Written next to a partial download so a later attempt can tell whether the
/// staged bytes belong to the same resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Checkpoint {
    url:         String,
    total_bytes: Option<u64>,
    created_at:  DateTime<Utc>,
}

/// Streams a single resource into a staging file and commits it by rename.
pub struct Fetcher<C: HttpClient> {
    client:      C,
    staging_dir: PathBuf,
}

impl<C: HttpClient> Fetcher<C> {
    pub fn new(client: C, staging_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            staging_dir: staging_dir.into(),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    /// Download `url` to `destination`.
    ///
    /// Reports progress through every [`FetchPhase`]. With
    /// [`FetchOptions::resume`] set, a failed or cancelled transfer leaves its
    /// bytes in staging and the next call for the same URL continues with a
    /// range request.
    pub async fn fetch(
        &self,
        url: &Url,
        destination: &Path,
        options: &FetchOptions,
    ) -> Result<PathBuf> {
        let url_str = url.as_str();
        let staging = |e| Error::download(url_str, DownloadCause::Staging(e));
        let mut gate = ProgressGate::new();

        report(options, FetchPhase::Connecting, 0, None, gate.last());

        let workspace = Workspace::new(&self.staging_dir, destination)
            .map_err(staging)?
            .keep_partial(options.resume);
        let checkpoint_path = checkpoint_path(workspace.path());

        let resume = if options.resume {
            resume_offset(&workspace, &checkpoint_path, url_str)
        } else {
            workspace.reset().map_err(staging)?;
            Resume::default()
        };

        if resume.is_complete() {
            tracing::info!(url = url_str, bytes = resume.offset, "staged download already complete");
            let (written, total) = (resume.offset, resume.total);
            return finish(workspace, &checkpoint_path, url_str, written, total, options, &mut gate);
        }

        let mut resume_from = resume.offset;
        let body = match self.open(url_str, options, resume_from).await {
            Err(e) if resume_from > 0 && C::is_range_not_satisfiable(&e) => {
                tracing::debug!(url = url_str, offset = resume_from, "range not satisfiable, restarting");
                workspace.reset().map_err(staging)?;
                let _ = std::fs::remove_file(&checkpoint_path);
                resume_from = 0;
                self.open(url_str, options, 0).await
            }
            other => other,
        }
        .map_err(|e| Error::download(url_str, DownloadCause::Transport(Box::new(e))))?;
        let total_bytes = body.total_bytes;

        let mut file = if body.offset > 0 {
            tracing::info!(url = url_str, offset = body.offset, "resuming download");
            tokio::fs::OpenOptions::new()
                .append(true)
                .open(workspace.path())
                .await
        } else {
            if resume_from > 0 {
                tracing::debug!(url = url_str, "server ignored range request, restarting");
            }
            tokio::fs::File::create(workspace.path()).await
        }
        .map_err(|e| Error::download(url_str, DownloadCause::Io(e)))?;

        if body.offset == 0 {
            let checkpoint = Checkpoint {
                url: url_str.to_string(),
                total_bytes,
                created_at: Utc::now(),
            };
            // Only needed for resume; a missing checkpoint just means a fresh start.
            if let Ok(bytes) = serde_json::to_vec(&checkpoint) {
                if let Err(e) = modelsight_fs::atomic_write(&checkpoint_path, &bytes) {
                    tracing::warn!(error = %e, "could not write download checkpoint");
                }
            }
        }

        let mut written = body.offset;
        report(
            options,
            FetchPhase::Downloading,
            written,
            total_bytes,
            gate.observe(written, total_bytes),
        );

        let mut stream = body.stream;
        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    // keep what already arrived on disk for the next attempt
                    let _ = file.flush().await;
                    return Err(Error::download(url_str, DownloadCause::Transport(Box::new(e))));
                }
            };
            file.write_all(&chunk)
                .await
                .map_err(|e| Error::download(url_str, DownloadCause::Io(e)))?;
            written += chunk.len() as u64;

            let fraction = gate.observe(written, total_bytes);
            report(options, FetchPhase::Downloading, written, total_bytes, fraction);
        }
        file.flush()
            .await
            .map_err(|e| Error::download(url_str, DownloadCause::Io(e)))?;
        drop(file);

        finish(workspace, &checkpoint_path, url_str, written, total_bytes, options, &mut gate)
    }

    async fn open(
        &self,
        url: &str,
        options: &FetchOptions,
        from: u64,
    ) -> std::result::Result<RemoteBody<C::Error>, C::Error> {
        self.client
            .stream(url, &options.headers, (from > 0).then_some(from))
            .await
    }
}

/// Verify the staged file and move it into place.
fn finish(
    workspace: Workspace,
    checkpoint_path: &Path,
    url: &str,
    written: u64,
    total_bytes: Option<u64>,
    options: &FetchOptions,
    gate: &mut ProgressGate,
) -> Result<PathBuf> {
    let staging = |e| Error::download(url, DownloadCause::Staging(e));

    report(options, FetchPhase::Verifying, written, total_bytes, gate.last());
    match modelsight_fs::file_size(workspace.path()).map_err(staging)? {
        None => return Err(Error::download(url, DownloadCause::Missing)),
        Some(0) => {
            let _ = workspace.reset();
            return Err(Error::download(url, DownloadCause::Empty));
        }
        Some(actual) => {
            if let Some(expected) = total_bytes.filter(|expected| actual < *expected) {
                return Err(Error::download(
                    url,
                    DownloadCause::Truncated { expected, actual },
                ));
            }
        }
    }

    report(options, FetchPhase::Committing, written, total_bytes, gate.last());
    let path = workspace.commit().map_err(staging)?;
    let _ = std::fs::remove_file(checkpoint_path);

    report(options, FetchPhase::Completed, written, total_bytes, gate.complete());
    tracing::info!(url, path = %path.display(), bytes = written, "download complete");
    Ok(path)
}

/// What an earlier attempt at the same URL left in staging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Resume {
    offset: u64,
    /// Size the checkpoint recorded for the whole resource.
    total:  Option<u64>,
}

impl Resume {
    fn is_complete(&self) -> bool {
        self.offset > 0 && self.total == Some(self.offset)
    }
}

/// Bytes that can be reused from an earlier attempt at the same URL.
fn resume_offset(workspace: &Workspace, checkpoint_path: &Path, url: &str) -> Resume {
    let staged = workspace.staged_len().unwrap_or(0);
    if staged == 0 {
        return Resume::default();
    }

    let checkpoint = modelsight_fs::atomic_read(checkpoint_path)
        .ok()
        .and_then(|bytes| serde_json::from_slice::<Checkpoint>(&bytes).ok())
        .filter(|c| c.url == url);
    match checkpoint {
        Some(c) if c.total_bytes.is_none_or(|total| staged <= total) => Resume {
            offset: staged,
            total:  c.total_bytes,
        },
        Some(_) => {
            tracing::debug!(url, staged, "partial download larger than the resource, discarding");
            let _ = workspace.reset();
            Resume::default()
        }
        None => {
            tracing::debug!(url, "discarding partial download without matching checkpoint");
            let _ = workspace.reset();
            Resume::default()
        }
    }
}

fn checkpoint_path(staged: &Path) -> PathBuf {
    staged.with_extension("json")
}

fn report(
    options: &FetchOptions,
    phase: FetchPhase,
    bytes_downloaded: u64,
    total_bytes: Option<u64>,
    fraction: f64,
) {
    if let Some(callback) = &options.on_progress {
        callback(&Progress {
            phase,
            bytes_downloaded,
            total_bytes,
            fraction,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkpoint_path() {
        assert_eq!(
            checkpoint_path(Path::new("/cache/models/.staging/abc_heart.glb.part")),
            PathBuf::from("/cache/models/.staging/abc_heart.glb.json")
        );
    }

    #[test]
    fn test_resume_completeness() {
        assert!(!Resume::default().is_complete());
        assert!(!Resume { offset: 8, total: None }.is_complete());
        assert!(!Resume { offset: 8, total: Some(16) }.is_complete());
        assert!(Resume { offset: 16, total: Some(16) }.is_complete());
    }

    #[test]
    fn test_checkpoint_serialization() {
        let checkpoint = Checkpoint {
            url:         "https://example.com/a.glb".into(),
            total_bytes: Some(42),
            created_at:  Utc::now(),
        };
        let json = serde_json::to_string(&checkpoint).unwrap();
        assert!(json.contains("\"total_bytes\":42"));
        let back: Checkpoint = serde_json::from_str(&json).unwrap();
        assert_eq!(back, checkpoint);
    }
}
