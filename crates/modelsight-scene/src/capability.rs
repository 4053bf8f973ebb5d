//! The rendering port.

use std::path::PathBuf;

use modelsight_reference::ModelFormat;

use crate::types::{Animation, MarkerTarget, Material, Transform};

/// Geometry the capability is asked to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeometrySource {
    /// A resolved local file, with its format as a type hint.
    File { path: PathBuf, format: ModelFormat },
    /// The fallback model shipped with the host, used when no reference is active.
    Bundled,
}

impl GeometrySource {
    /// Source for a resolved path, inferring the format from its extension.
    ///
    /// Paths without a recognised extension are loaded as GLB.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let format = path
            .to_str()
            .and_then(ModelFormat::from_path)
            .unwrap_or(ModelFormat::Glb);
        Self::File { path, format }
    }
}

/// An AR rendering engine that owns the scene graph.
///
/// Loading is asynchronous on the engine side: `load_object` only starts it
/// and the outcome comes back as [`CapabilityEvent`](crate::CapabilityEvent)s
/// fed into [`SceneController::handle_event`](crate::SceneController::handle_event).
pub trait RenderCapability: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Register the image to anchor to. Only called in marker mode, before
    /// [`load_object`](Self::load_object).
    fn register_marker_target(&self, target: &MarkerTarget) -> Result<(), Self::Error>;

    fn load_object(&self, source: &GeometrySource) -> Result<(), Self::Error>;

    fn set_transform(&self, transform: &Transform) -> Result<(), Self::Error>;

    fn create_materials(&self, materials: &[Material]) -> Result<(), Self::Error>;

    fn register_animations(&self, animations: &[Animation]) -> Result<(), Self::Error>;

    /// Release everything created for this scene.
    fn dispose(&self);
}
