//! Error types for modelsight-reference.

use thiserror::Error;

/// Why a scanned payload is not a usable model reference.
///
/// Both variants are user-input errors: the caller shows them and offers a
/// rescan, they never count against a session's error budget.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid QR code: {reason}")]
    InvalidQrFormat { reason: String },

    #[error("unsupported URL scheme `{scheme}`")]
    UnsupportedUrlScheme { scheme: String },
}

impl ValidationError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidQrFormat {
            reason: reason.into(),
        }
    }
}

/// Failure of the capture/decode capability itself.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("code detector failed: {0}")]
    Detector(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = ValidationError> = std::result::Result<T, E>;
