use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use modelsight_reference::{ReferenceValidator, ValidatorOptions};
use modelsight_scene::{MarkerTarget, SceneConfig};
use serde::{Deserialize, Serialize};

/// Looked up in the working directory when `--config` is not given.
pub const CONFIG_FILE: &str = "modelsight.toml";
pub const ENV_PREFIX: &str = "MODELSIGHT_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the asset cache; models land in `<cache_dir>/models`.
    pub cache_dir:            PathBuf,
    /// JSON file holding the current model slots.
    pub store_path:           PathBuf,
    pub strict_https:         bool,
    pub extract_embedded:     bool,
    pub max_errors:           u32,
    /// Keep partial downloads and continue them with range requests.
    pub resume:               bool,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs:    u64,
    pub scene:                SceneSettings,
}

/// Scene timings in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneSettings {
    pub settle_delay_ms:    u64,
    pub load_timeout_ms:    u64,
    pub acquire_timeout_ms: u64,
    pub rotation_period_ms: u64,
    pub marker_tracking:    bool,
    pub auto_rotate:        bool,
    /// Marker image URI; the bundled marker when unset.
    pub marker_image:       Option<String>,
    /// Printed marker width in meters.
    pub marker_width:       f32,
}

impl Default for Config {
    fn default() -> Self {
        let root = home::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".modelsight");
        Self {
            cache_dir:            root.join("cache"),
            store_path:           root.join("session.json"),
            strict_https:         false,
            extract_embedded:     false,
            max_errors:           modelsight_session::MAX_ERRORS,
            resume:               true,
            connect_timeout_secs: 10,
            read_timeout_secs:    30,
            scene:                SceneSettings::default(),
        }
    }
}

impl Default for SceneSettings {
    fn default() -> Self {
        let scene = SceneConfig::default();
        Self {
            settle_delay_ms:    millis(scene.settle_delay),
            load_timeout_ms:    millis(scene.load_timeout),
            acquire_timeout_ms: millis(scene.acquire_timeout),
            rotation_period_ms: millis(scene.rotation_period),
            marker_tracking:    scene.marker_tracking,
            auto_rotate:        scene.auto_rotate,
            marker_image:       None,
            marker_width:       scene.marker_target.physical_width,
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl Config {
    /// Defaults, then the TOML file, then `MODELSIGHT_*` variables.
    ///
    /// Nested keys use a double underscore, e.g. `MODELSIGHT_SCENE__AUTO_ROTATE`.
    pub fn figment(path: Option<&Path>) -> Figment {
        let file = path.map_or_else(|| PathBuf::from(CONFIG_FILE), Path::to_path_buf);
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn load(path: Option<&Path>) -> Result<Self, figment::Error> {
        Self::figment(path).extract()
    }

    pub fn validator(&self) -> ReferenceValidator {
        ReferenceValidator::new(ValidatorOptions {
            require_https:    self.strict_https,
            extract_embedded: self.extract_embedded,
        })
    }

    pub fn scene_config(&self) -> SceneConfig {
        self.scene_config_with_marker(None)
    }

    /// Scene settings with `stored_marker` taking precedence over the
    /// configured marker image.
    pub fn scene_config_with_marker(&self, stored_marker: Option<String>) -> SceneConfig {
        let s = &self.scene;
        let target = match stored_marker.or_else(|| s.marker_image.clone()) {
            Some(uri) => MarkerTarget::uri(uri),
            None => MarkerTarget::default(),
        };
        SceneConfig::default()
            .settle_delay(Duration::from_millis(s.settle_delay_ms))
            .load_timeout(Duration::from_millis(s.load_timeout_ms))
            .acquire_timeout(Duration::from_millis(s.acquire_timeout_ms))
            .rotation_period(Duration::from_millis(s.rotation_period_ms))
            .marker_tracking(s.marker_tracking)
            .auto_rotate(s.auto_rotate)
            .marker_target(target.physical_width(s.marker_width))
    }
}
