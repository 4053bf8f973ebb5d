use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SessionError;

/// Consecutive counted failures before the session starts over.
pub const MAX_ERRORS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Scanning,
    Validating,
    Downloading,
    Ready,
    Rendering,
    Error,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Scanning => "scanning",
            Self::Validating => "validating",
            Self::Downloading => "downloading",
            Self::Ready => "ready",
            Self::Rendering => "rendering",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionState {
    pub phase:       Phase,
    pub error_count: u32,
    pub last_error:  Option<SessionError>,
}
