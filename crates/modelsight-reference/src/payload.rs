use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw text decoded from a code, stamped with the capture time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanPayload {
    pub text:      String,
    pub timestamp: DateTime<Utc>,
}

impl ScanPayload {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text:      text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Symbologies reported by a detector. Only [`CodeKind::Qr`] is consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeKind {
    Qr,
    Other(String),
}

/// One code found in a capture, as reported by the detector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedCode {
    pub kind:  CodeKind,
    pub value: String,
}

impl DetectedCode {
    pub fn qr(value: impl Into<String>) -> Self {
        Self {
            kind:  CodeKind::Qr,
            value: value.into(),
        }
    }
}

/// Input handed to the detector.
#[derive(Debug, Clone)]
pub enum Capture {
    /// A live 8-bit luma frame from the camera stream.
    Frame {
        width:  u32,
        height: u32,
        luma:   Vec<u8>,
    },
    /// A still image already written to disk.
    Still(PathBuf),
    /// Text from a source that decodes on its own, e.g. a handheld scanner
    /// in keyboard mode or a pasted link.
    Text(String),
}
