//! Error types for modelsight-fetch.

use std::path::PathBuf;

use modelsight_reference::ValidationError;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid model reference: {0}")]
    InvalidUri(#[from] ValidationError),

    #[error("local model file not found: {}", .0.display())]
    LocalFileNotFound(PathBuf),

    #[error("failed to download {url}: {cause}")]
    DownloadFailure {
        url:   String,
        #[source]
        cause: DownloadCause,
    },

    #[error("cache directory unavailable: {0}")]
    Cache(#[source] modelsight_fs::Error),
}

/// Underlying reason of a [`Error::DownloadFailure`].
#[derive(Debug, Error)]
pub enum DownloadCause {
    #[error("transport error: {0}")]
    Transport(#[source] BoxError),

    #[error("i/o error: {0}")]
    Io(#[source] std::io::Error),

    #[error("staging error: {0}")]
    Staging(#[source] modelsight_fs::Error),

    #[error("downloaded file is empty")]
    Empty,

    #[error("downloaded file is missing")]
    Missing,

    #[error("transfer ended early: expected {expected} bytes, got {actual}")]
    Truncated { expected: u64, actual: u64 },
}

impl Error {
    pub(crate) fn download(url: &str, cause: DownloadCause) -> Self {
        Self::DownloadFailure {
            url: url.to_string(),
            cause,
        }
    }

    pub fn is_download_failure(&self) -> bool {
        matches!(self, Self::DownloadFailure { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
