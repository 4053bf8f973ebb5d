use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelStatus {
    #[default]
    Unresolved,
    Downloading,
    Ready,
    Failed,
}

/// The asset a session is currently working with.
///
/// `download_progress` only moves forward while the status is
/// [`ModelStatus::Downloading`], and a completed transfer is immediately
/// followed by [`ModelStatus::Ready`] or [`ModelStatus::Failed`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelReference {
    source_uri:        String,
    local_path:        Option<PathBuf>,
    status:            ModelStatus,
    download_progress: f64,
}

impl ModelReference {
    pub fn new(source_uri: impl Into<String>) -> Self {
        Self {
            source_uri:        source_uri.into(),
            local_path:        None,
            status:            ModelStatus::Unresolved,
            download_progress: 0.0,
        }
    }

    pub fn source_uri(&self) -> &str {
        &self.source_uri
    }

    pub fn local_path(&self) -> Option<&Path> {
        self.local_path.as_deref()
    }

    pub fn status(&self) -> ModelStatus {
        self.status
    }

    pub fn download_progress(&self) -> f64 {
        self.download_progress
    }

    pub fn begin_download(&mut self) {
        self.status = ModelStatus::Downloading;
        self.download_progress = 0.0;
    }

    /// Record a progress report, ignoring regressions and values outside
    /// `[0, 1]`. Returns the stored value.
    pub fn record_progress(&mut self, fraction: f64) -> f64 {
        if self.status == ModelStatus::Downloading && fraction.is_finite() {
            self.download_progress = self.download_progress.max(fraction.clamp(0.0, 1.0));
        }
        self.download_progress
    }

    pub fn mark_ready(&mut self, local_path: impl Into<PathBuf>) {
        self.local_path = Some(local_path.into());
        self.download_progress = 1.0;
        self.status = ModelStatus::Ready;
    }

    pub fn mark_failed(&mut self) {
        self.status = ModelStatus::Failed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_is_monotonic() {
        let mut model = ModelReference::new("https://example.com/a.glb");
        model.begin_download();
        assert_eq!(model.record_progress(0.4), 0.4);
        assert_eq!(model.record_progress(0.2), 0.4);
        assert_eq!(model.record_progress(f64::NAN), 0.4);
        assert_eq!(model.record_progress(7.0), 1.0);
    }

    #[test]
    fn test_progress_ignored_outside_download() {
        let mut model = ModelReference::new("https://example.com/a.glb");
        assert_eq!(model.record_progress(0.5), 0.0);
        model.begin_download();
        model.mark_failed();
        assert_eq!(model.record_progress(0.5), 0.0);
        assert_eq!(model.status(), ModelStatus::Failed);
    }

    #[test]
    fn test_ready_sets_path_and_full_progress() {
        let mut model = ModelReference::new("https://example.com/a.glb");
        model.begin_download();
        model.record_progress(0.3);
        model.mark_ready("/cache/models/a.glb");
        assert_eq!(model.status(), ModelStatus::Ready);
        assert_eq!(model.download_progress(), 1.0);
        assert_eq!(model.local_path(), Some(Path::new("/cache/models/a.glb")));
    }
}
