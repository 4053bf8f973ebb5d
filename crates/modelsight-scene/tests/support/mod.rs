#![allow(dead_code)]

use std::convert::Infallible;
use std::sync::{Arc, Mutex};

use modelsight_scene::{
    Animation, GeometrySource, LoadOutcome, MarkerState, MarkerTarget, Material, RenderCapability,
    SceneError, SceneObserver, Transform,
};

/// Everything that happened, in order: capability calls and the events fed in.
pub type Log = Arc<Mutex<Vec<String>>>;

#[derive(Clone, Default)]
pub struct RecordingRender {
    pub log:        Log,
    pub transforms: Arc<Mutex<Vec<Transform>>>,
    pub animations: Arc<Mutex<Vec<Animation>>>,
    pub targets:    Arc<Mutex<Vec<MarkerTarget>>>,
}

impl RecordingRender {
    pub fn with_log(log: Log) -> Self {
        Self {
            log,
            ..Self::default()
        }
    }

    pub fn count(&self, entry: &str) -> usize {
        self.log.lock().unwrap().iter().filter(|e| *e == entry).count()
    }

    pub fn last_transform(&self) -> Option<Transform> {
        self.transforms.lock().unwrap().last().copied()
    }
}

impl RenderCapability for RecordingRender {
    type Error = Infallible;

    fn register_marker_target(&self, target: &MarkerTarget) -> Result<(), Self::Error> {
        self.targets.lock().unwrap().push(target.clone());
        self.log.lock().unwrap().push("target".into());
        Ok(())
    }

    fn load_object(&self, source: &GeometrySource) -> Result<(), Self::Error> {
        let entry = match source {
            GeometrySource::File { .. } => "load:file",
            GeometrySource::Bundled => "load:bundled",
        };
        self.log.lock().unwrap().push(entry.into());
        Ok(())
    }

    fn set_transform(&self, transform: &Transform) -> Result<(), Self::Error> {
        self.transforms.lock().unwrap().push(*transform);
        Ok(())
    }

    fn create_materials(&self, _materials: &[Material]) -> Result<(), Self::Error> {
        self.log.lock().unwrap().push("materials".into());
        Ok(())
    }

    fn register_animations(&self, animations: &[Animation]) -> Result<(), Self::Error> {
        self.animations.lock().unwrap().extend_from_slice(animations);
        self.log.lock().unwrap().push("animations".into());
        Ok(())
    }

    fn dispose(&self) {
        self.log.lock().unwrap().push("dispose".into());
    }
}

#[derive(Default)]
pub struct RecordingObserver {
    pub notices: Mutex<Vec<String>>,
}

impl RecordingObserver {
    pub fn notices(&self) -> Vec<String> {
        self.notices.lock().unwrap().clone()
    }

    fn push(&self, notice: String) {
        self.notices.lock().unwrap().push(notice);
    }
}

impl SceneObserver for RecordingObserver {
    fn on_loading(&self, loading: bool) {
        self.push(format!("loading:{loading}"));
    }

    fn on_loaded(&self, outcome: LoadOutcome) {
        self.push(format!("loaded:{outcome:?}"));
    }

    fn on_error(&self, error: &SceneError) {
        self.push(format!("error:{:?}", error.kind));
    }

    fn on_marker(&self, state: MarkerState) {
        self.push(format!("marker:{state:?}"));
    }

    fn on_tracking_lost(&self) {
        self.push("tracking_lost".into());
    }
}
