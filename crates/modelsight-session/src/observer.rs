use modelsight_scene::LoadOutcome;

use crate::error::SessionError;
use crate::persistence::ModelMetadata;
use crate::state::SessionState;

/// Host-side view of a session: the screen that shows scanning, progress,
/// errors and the AR view. Every method defaults to a no-op.
pub trait SessionObserver: Send + Sync {
    fn on_state(&self, _state: &SessionState) {}

    /// Download progress in `[0, 1]`, non-decreasing per model.
    fn on_progress(&self, _fraction: f64) {}

    fn on_ready(&self, _metadata: &ModelMetadata) {}

    fn on_error(&self, _error: &SessionError) {}

    fn on_loading(&self, _loading: bool) {}

    fn on_scene_loaded(&self, _outcome: LoadOutcome) {}

    /// The marker went out of view. Informational only.
    fn on_tracking_lost(&self) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl SessionObserver for NoopObserver {}
