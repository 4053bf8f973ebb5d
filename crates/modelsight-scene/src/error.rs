//! Error types for modelsight-scene.

use std::fmt;

use thiserror::Error;

/// Failures the scene reports upward. The scene never retries on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneErrorKind {
    /// The capability could not load the geometry.
    ModelLoadFailure,
    /// Marker tracking never found an anchor within the acquire timeout.
    MarkerNotAcquired,
}

impl fmt::Display for SceneErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ModelLoadFailure => write!(f, "model load failure"),
            Self::MarkerNotAcquired => write!(f, "marker not acquired"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct SceneError {
    pub kind:    SceneErrorKind,
    pub message: String,
}

impl SceneError {
    pub fn load_failure(message: impl Into<String>) -> Self {
        Self {
            kind:    SceneErrorKind::ModelLoadFailure,
            message: message.into(),
        }
    }

    pub fn not_acquired(message: impl Into<String>) -> Self {
        Self {
            kind:    SceneErrorKind::MarkerNotAcquired,
            message: message.into(),
        }
    }
}

/// A raw capability event that could not be normalized.
#[derive(Debug, Error)]
pub enum EventError {
    #[error("unknown capability event `{0}`")]
    Unknown(String),

    #[error("malformed payload for `{name}`: {source}")]
    Payload {
        name:   String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid gesture state {0}")]
    GestureState(u8),
}
