use std::time::Duration;

use crate::types::{MarkerTarget, Material};

/// Timings and behaviour of a mounted scene.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneConfig {
    /// Wait between the load completion signal and material registration.
    /// Zero registers on the signal itself.
    ///
    /// Default: 500ms
    pub settle_delay: Duration,

    /// Give up waiting for a load outcome and treat the object as loaded.
    ///
    /// Default: 30s
    pub load_timeout: Duration,

    /// In marker mode, report `MarkerNotAcquired` if no anchor shows up.
    ///
    /// Default: 15s
    pub acquire_timeout: Duration,

    /// One full turn of the rotation animation.
    ///
    /// Default: 10s
    pub rotation_period: Duration,

    /// Anchor the object to an image marker instead of placing it in front
    /// of the camera.
    ///
    /// Default: false
    pub marker_tracking: bool,

    /// Image anchored to in marker mode.
    ///
    /// Default: the bundled marker, 0.1m wide
    pub marker_target: MarkerTarget,

    /// Rotate from the start (world mode) or as soon as a marker is found.
    ///
    /// Default: true
    pub auto_rotate: bool,

    pub materials: Vec<Material>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            settle_delay:    Duration::from_millis(500),
            load_timeout:    Duration::from_secs(30),
            acquire_timeout: Duration::from_secs(15),
            rotation_period: Duration::from_secs(10),
            marker_tracking: false,
            marker_target:   MarkerTarget::default(),
            auto_rotate:     true,
            materials:       vec![Material::default_material()],
        }
    }
}

impl SceneConfig {
    #[must_use]
    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    #[must_use]
    pub fn load_timeout(mut self, timeout: Duration) -> Self {
        self.load_timeout = timeout;
        self
    }

    #[must_use]
    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    #[must_use]
    pub fn rotation_period(mut self, period: Duration) -> Self {
        self.rotation_period = period;
        self
    }

    #[must_use]
    pub fn marker_tracking(mut self, enabled: bool) -> Self {
        self.marker_tracking = enabled;
        self
    }

    #[must_use]
    pub fn marker_target(mut self, target: MarkerTarget) -> Self {
        self.marker_target = target;
        self
    }

    #[must_use]
    pub fn auto_rotate(mut self, enabled: bool) -> Self {
        self.auto_rotate = enabled;
        self
    }

    #[must_use]
    pub fn materials(mut self, materials: Vec<Material>) -> Self {
        self.materials = materials;
        self
    }

    /// Yaw advance in degrees for a frame of `delta`.
    pub fn yaw_step(&self, delta: Duration) -> f32 {
        let period_ms = self.rotation_period.as_secs_f64() * 1000.0;
        if period_ms <= 0.0 {
            return 0.0;
        }
        let delta_ms = delta.as_secs_f64() * 1000.0;
        ((360.0 / period_ms) * delta_ms) as f32
    }
}
