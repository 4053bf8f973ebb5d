//! Lifecycle of a model rendered by an external AR capability.
//!
//! - [`SceneController`] - load sequencing, deferred material registration,
//!   gestures, marker tracking and teardown
//! - [`RenderCapability`] - the engine port; the engine's own pipeline is opaque
//! - [`FrameScheduler`] - per-frame ticks driving the rotation animation
//! - [`RawCapabilityEvent`] - engine callbacks, normalized into [`CapabilityEvent`]

mod capability;
mod config;
mod controller;
mod error;
mod event;
mod observer;
mod scheduler;
mod types;

pub use capability::{GeometrySource, RenderCapability};
pub use config::SceneConfig;
pub use controller::SceneController;
pub use error::{EventError, SceneError, SceneErrorKind};
pub use event::{CapabilityEvent, GestureState, RawCapabilityEvent};
pub use observer::{LoadOutcome, NoopSceneObserver, SceneObserver};
pub use scheduler::{FrameCallback, FrameHandle, FrameScheduler, IntervalScheduler, ManualScheduler};
pub use types::{
    Animation, DEFAULT_MARKER_WIDTH, DEFAULT_SCALE, Easing, LightingModel, MAX_SCALE, MIN_SCALE,
    MarkerImage, MarkerState, MarkerTarget, Material, SceneRuntimeState, Transform, Vec3,
};
