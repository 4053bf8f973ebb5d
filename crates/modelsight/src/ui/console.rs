use std::sync::{Mutex, MutexGuard, PoisonError};

use modelsight_scene::LoadOutcome;
use modelsight_session::{ModelMetadata, Phase, SessionError, SessionObserver, SessionState};

use super::tracker::{ProgressTracker, ProgressTrackerBuilder, Unit};

/// Prints session milestones and draws a bar while a model downloads.
#[derive(Default)]
pub struct ConsoleObserver {
    tracker: Mutex<Option<ProgressTracker>>,
    quiet:   bool,
}

impl ConsoleObserver {
    /// Observer that prints milestones but never draws a bar.
    pub fn quiet() -> Self {
        Self {
            quiet: true,
            ..Self::default()
        }
    }

    fn tracker(&self) -> MutexGuard<'_, Option<ProgressTracker>> {
        self.tracker.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionObserver for ConsoleObserver {
    fn on_state(&self, state: &SessionState) {
        tracing::debug!(phase = %state.phase, errors = state.error_count, "session state");
        if state.phase == Phase::Downloading {
            let tracker = ProgressTrackerBuilder::default()
                .with_unit(Unit::Percent)
                .with_prefix("model")
                .with_finish("ready")
                .hidden(self.quiet)
                .build();
            *self.tracker() = Some(tracker);
        }
    }

    fn on_progress(&self, fraction: f64) {
        if let Some(tracker) = self.tracker().as_ref() {
            tracker.set_fraction(fraction);
        }
    }

    fn on_ready(&self, metadata: &ModelMetadata) {
        if let Some(tracker) = self.tracker().take() {
            tracker.finish();
        }
        println!("ready\t{}\t{}", metadata.source_uri, metadata.local_path.display());
    }

    fn on_error(&self, error: &SessionError) {
        if let Some(tracker) = self.tracker().take() {
            tracker.abandon(error.kind.to_string());
        }
        println!("error\t{}\t{}", error.kind, error.message);
    }

    fn on_scene_loaded(&self, outcome: LoadOutcome) {
        println!("scene\t{outcome:?}");
    }

    fn on_tracking_lost(&self) {
        println!("scene\ttracking lost");
    }
}
