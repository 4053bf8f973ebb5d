//! A [`RenderCapability`] without a display.
//!
//! Loading checks that the model file is readable and reports the outcome
//! through the same callbacks a real engine would fire, on a channel the
//! caller drains into [`modelsight_scene::SceneController::handle_event`].

use std::sync::{Mutex, PoisonError};

use modelsight_scene::{
    Animation, CapabilityEvent, GeometrySource, MarkerTarget, Material, RenderCapability,
    Transform,
};
use thiserror::Error;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

#[derive(Debug, Error)]
pub enum HeadlessError {
    #[error("scene event channel closed")]
    Closed,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct RenderLog {
    pub loads:      usize,
    /// Name of the registered marker target, in marker mode.
    pub target:     Option<String>,
    pub transforms: usize,
    pub materials:  Vec<String>,
    pub animations: Vec<String>,
    pub disposed:   bool,
}

pub struct HeadlessRender {
    events: UnboundedSender<CapabilityEvent>,
    log:    Mutex<RenderLog>,
}

impl HeadlessRender {
    pub fn new() -> (Self, UnboundedReceiver<CapabilityEvent>) {
        let (events, rx) = unbounded_channel();
        let render = Self {
            events,
            log: Mutex::new(RenderLog::default()),
        };
        (render, rx)
    }

    pub fn log(&self) -> RenderLog {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, f: impl FnOnce(&mut RenderLog)) {
        let mut log = self
            .log
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut log);
    }

    fn send(&self, event: CapabilityEvent) -> Result<(), HeadlessError> {
        self.events.send(event).map_err(|_| HeadlessError::Closed)
    }
}

impl RenderCapability for HeadlessRender {
    type Error = HeadlessError;

    fn register_marker_target(&self, target: &MarkerTarget) -> Result<(), Self::Error> {
        tracing::debug!(?target, "registering marker target");
        self.record(|log| log.target = Some(target.name().to_string()));
        Ok(())
    }

    fn load_object(&self, source: &GeometrySource) -> Result<(), Self::Error> {
        self.record(|log| log.loads += 1);
        self.send(CapabilityEvent::LoadStart)?;

        let outcome = match source {
            GeometrySource::Bundled => CapabilityEvent::LoadEnd,
            GeometrySource::File { path, .. } => match std::fs::metadata(path) {
                Ok(meta) if meta.is_file() && meta.len() > 0 => CapabilityEvent::LoadEnd,
                Ok(_) => CapabilityEvent::LoadError {
                    message: format!("{} is empty", path.display()),
                },
                Err(e) => CapabilityEvent::LoadError {
                    message: format!("cannot read {}: {e}", path.display()),
                },
            },
        };
        self.send(outcome)
    }

    fn set_transform(&self, transform: &Transform) -> Result<(), Self::Error> {
        tracing::trace!(?transform, "transform");
        self.record(|log| log.transforms += 1);
        Ok(())
    }

    fn create_materials(&self, materials: &[Material]) -> Result<(), Self::Error> {
        self.record(|log| {
            log.materials
                .extend(materials.iter().map(|m| m.name.clone()));
        });
        Ok(())
    }

    fn register_animations(&self, animations: &[Animation]) -> Result<(), Self::Error> {
        self.record(|log| {
            log.animations
                .extend(animations.iter().map(|a| a.name.clone()));
        });
        Ok(())
    }

    fn dispose(&self) {
        self.record(|log| log.disposed = true);
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn test_missing_file_reports_load_error() {
        let (render, mut rx) = HeadlessRender::new();
        render
            .load_object(&GeometrySource::file(PathBuf::from("/nonexistent/heart.glb")))
            .unwrap();
        assert_eq!(rx.try_recv().unwrap(), CapabilityEvent::LoadStart);
        assert!(matches!(rx.try_recv().unwrap(), CapabilityEvent::LoadError { .. }));
    }

    #[test]
    fn test_readable_file_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("heart.glb");
        std::fs::write(&path, b"glTF").unwrap();

        let (render, mut rx) = HeadlessRender::new();
        render.load_object(&GeometrySource::file(path)).unwrap();
        assert_eq!(rx.try_recv().unwrap(), CapabilityEvent::LoadStart);
        assert_eq!(rx.try_recv().unwrap(), CapabilityEvent::LoadEnd);
        assert_eq!(render.log().loads, 1);
    }

    #[test]
    fn test_marker_target_is_logged() {
        let (render, _rx) = HeadlessRender::new();
        assert_eq!(render.log().target, None);
        render
            .register_marker_target(&MarkerTarget::uri("https://cdn.example.com/marker.png"))
            .unwrap();
        assert_eq!(render.log().target.as_deref(), Some("markerTarget"));
    }

    #[test]
    fn test_closed_channel() {
        let (render, rx) = HeadlessRender::new();
        drop(rx);
        assert!(render.load_object(&GeometrySource::Bundled).is_err());
    }
}
