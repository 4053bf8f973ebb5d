use serde::{Deserialize, Serialize};

/// Smallest scale a pinch can produce.
pub const MIN_SCALE: f32 = 0.01;
/// Largest scale a pinch can produce.
pub const MAX_SCALE: f32 = 2.0;
/// Uniform scale a freshly mounted object starts with.
pub const DEFAULT_SCALE: f32 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub const fn splat(v: f32) -> Self {
        Self::new(v, v, v)
    }
}

/// What the capability is told to draw. Rotation is in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub rotation: Vec3,
    pub scale:    Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerState {
    #[default]
    Searching,
    Found,
    Lost,
}

/// Live state of the mounted object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SceneRuntimeState {
    pub rotation:        Vec3,
    pub scale:           Vec3,
    /// Scale committed by the last finished pinch.
    pub base_scale:      f32,
    pub marker_state:    MarkerState,
    pub geometry_loaded: bool,
}

impl Default for SceneRuntimeState {
    fn default() -> Self {
        Self {
            rotation:        Vec3::default(),
            scale:           Vec3::splat(DEFAULT_SCALE),
            base_scale:      DEFAULT_SCALE,
            marker_state:    MarkerState::Searching,
            geometry_loaded: false,
        }
    }
}

impl SceneRuntimeState {
    pub fn transform(&self) -> Transform {
        Transform {
            rotation: self.rotation,
            scale:    self.scale,
        }
    }

    /// Advance yaw by `degrees`, wrapped into `[0, 360)`.
    pub fn add_yaw(&mut self, degrees: f32) {
        let yaw = (self.rotation.y + degrees).rem_euclid(360.0);
        // rem_euclid rounds tiny negative sums up to exactly 360.0 in f32
        self.rotation.y = if yaw >= 360.0 { 0.0 } else { yaw };
    }
}

/// Real-world width of the printed marker, in meters.
pub const DEFAULT_MARKER_WIDTH: f32 = 0.1;

/// Image the capability tracks in marker mode.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MarkerImage {
    /// The marker shipped with the host.
    #[default]
    Bundled,
    Uri(String),
}

/// A tracking target registered with the capability before loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerTarget {
    pub image:          MarkerImage,
    pub physical_width: f32,
}

impl Default for MarkerTarget {
    fn default() -> Self {
        Self {
            image:          MarkerImage::Bundled,
            physical_width: DEFAULT_MARKER_WIDTH,
        }
    }
}

impl MarkerTarget {
    pub fn uri(uri: impl Into<String>) -> Self {
        Self {
            image: MarkerImage::Uri(uri.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn physical_width(mut self, meters: f32) -> Self {
        self.physical_width = meters;
        self
    }

    /// Name the target is registered under.
    pub fn name(&self) -> &'static str {
        match self.image {
            MarkerImage::Bundled => "defaultMarker",
            MarkerImage::Uri(_) => "markerTarget",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LightingModel {
    Blinn,
    Lambert,
    Phong,
    Constant,
}

/// A named material handed to the capability after geometry is loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name:           String,
    /// `#RRGGBB`
    pub diffuse_color:  String,
    pub lighting_model: LightingModel,
    pub shininess:      f32,
}

impl Material {
    pub fn default_material() -> Self {
        Self {
            name:           "defaultMaterial".into(),
            diffuse_color:  "#F0F0F0".into(),
            lighting_model: LightingModel::Blinn,
            shininess:      0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Easing {
    Linear,
    EaseInEaseOut,
}

/// A property animation registered with the capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Animation {
    pub name:        String,
    /// Relative yaw change over one run, in degrees.
    pub rotate_y:    f32,
    pub duration_ms: u64,
    pub easing:      Option<Easing>,
}

impl Animation {
    /// `rotate` and `loopRotate`: one full turn per `period_ms`.
    pub fn turntable(period_ms: u64) -> Vec<Self> {
        vec![
            Self {
                name:        "rotate".into(),
                rotate_y:    360.0,
                duration_ms: period_ms,
                easing:      None,
            },
            Self {
                name:        "loopRotate".into(),
                rotate_y:    360.0,
                duration_ms: period_ms,
                easing:      Some(Easing::Linear),
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaw_wraps() {
        let mut state = SceneRuntimeState::default();
        state.add_yaw(350.0);
        state.add_yaw(20.0);
        assert!((state.rotation.y - 10.0).abs() < 1e-4);
        state.add_yaw(-30.0);
        assert!((state.rotation.y - 340.0).abs() < 1e-4);
    }

    #[test]
    fn test_yaw_never_reaches_full_turn() {
        let mut state = SceneRuntimeState::default();
        state.add_yaw(-1e-6);
        assert!(state.rotation.y < 360.0);
        assert_eq!(state.rotation.y, 0.0);

        state.add_yaw(-1e-3);
        assert!(state.rotation.y > 359.0 && state.rotation.y < 360.0);
    }

    #[test]
    fn test_defaults() {
        let state = SceneRuntimeState::default();
        assert_eq!(state.scale, Vec3::splat(DEFAULT_SCALE));
        assert_eq!(state.marker_state, MarkerState::Searching);
        assert!(!state.geometry_loaded);
    }
}
