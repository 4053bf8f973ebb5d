use crate::error::SceneError;
use crate::types::MarkerState;

/// How a load ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The capability signalled completion.
    Complete,
    /// No completion signal arrived before the load timeout.
    BestEffort,
}

/// Receives scene notifications. Every method defaults to a no-op.
///
/// Methods are never called while the controller holds its internal lock,
/// so implementations may call back into the controller.
pub trait SceneObserver: Send + Sync {
    /// Whether a loading indicator should be shown.
    fn on_loading(&self, _loading: bool) {}

    fn on_loaded(&self, _outcome: LoadOutcome) {}

    fn on_error(&self, _error: &SceneError) {}

    fn on_marker(&self, _state: MarkerState) {}

    /// The marker anchor was removed. Not an error; rotation pauses.
    fn on_tracking_lost(&self) {}
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSceneObserver;

impl SceneObserver for NoopSceneObserver {}
