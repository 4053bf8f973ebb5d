//! Error types for modelsight-session.

use std::fmt;

use modelsight_reference::ValidationError;
use modelsight_scene::{SceneError, SceneErrorKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::state::Phase;

/// Classification of everything that can push a session into `Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidQrFormat,
    UnsupportedUrlScheme,
    DownloadFailure,
    ModelLoadFailure,
    MarkerNotAcquired,
}

impl ErrorKind {
    /// Validation problems are the user's to fix and never use up retries.
    pub fn counts_toward_budget(self) -> bool {
        !matches!(self, Self::InvalidQrFormat | Self::UnsupportedUrlScheme)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::InvalidQrFormat => "invalid QR format",
            Self::UnsupportedUrlScheme => "unsupported URL scheme",
            Self::DownloadFailure => "download failure",
            Self::ModelLoadFailure => "model load failure",
            Self::MarkerNotAcquired => "marker not acquired",
        };
        f.write_str(s)
    }
}

/// A user-facing failure recorded on the session.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct SessionError {
    pub kind:    ErrorKind,
    pub message: String,
}

impl SessionError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<&ValidationError> for SessionError {
    fn from(e: &ValidationError) -> Self {
        let kind = match e {
            ValidationError::InvalidQrFormat { .. } => ErrorKind::InvalidQrFormat,
            ValidationError::UnsupportedUrlScheme { .. } => ErrorKind::UnsupportedUrlScheme,
        };
        Self::new(kind, e.to_string())
    }
}

impl From<&modelsight_fetch::Error> for SessionError {
    fn from(e: &modelsight_fetch::Error) -> Self {
        match e {
            modelsight_fetch::Error::InvalidUri(v) => Self::from(v),
            other => Self::new(ErrorKind::DownloadFailure, other.to_string()),
        }
    }
}

impl From<&SceneError> for SessionError {
    fn from(e: &SceneError) -> Self {
        let kind = match e.kind {
            SceneErrorKind::ModelLoadFailure => ErrorKind::ModelLoadFailure,
            SceneErrorKind::MarkerNotAcquired => ErrorKind::MarkerNotAcquired,
        };
        Self::new(kind, e.message.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("event `{event}` is not allowed in phase {phase}")]
    Illegal { phase: Phase, event: &'static str },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Fs(#[from] modelsight_fs::Error),

    #[error("store contents are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = StoreError> = std::result::Result<T, E>;
