use super::options::FetchPhase;

/// Snapshot handed to progress callbacks.
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    pub phase: FetchPhase,

    /// Bytes present in the staging file, including resumed ones.
    pub bytes_downloaded: u64,

    /// Size of the whole asset, if the server announced it.
    pub total_bytes: Option<u64>,

    /// Completion in `[0, 1]`; non-decreasing for the lifetime of a download.
    pub fraction: f64,
}

impl Progress {
    /// Completion as a whole percentage, for display.
    #[must_use]
    pub fn percent(&self) -> u8 {
        (self.fraction.clamp(0.0, 1.0) * 100.0).round() as u8
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.phase == FetchPhase::Completed
    }
}
