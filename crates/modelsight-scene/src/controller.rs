//! Scene lifecycle around a [`RenderCapability`].
//!
//! The controller owns the mutable [`SceneRuntimeState`] and is the only
//! place that talks to the capability. Capability callbacks come in through
//! [`SceneController::handle_event`]; timers run on tokio and hold only a weak
//! reference, so a dropped controller silences them.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::capability::{GeometrySource, RenderCapability};
use crate::config::SceneConfig;
use crate::error::{EventError, SceneError};
use crate::event::{CapabilityEvent, GestureState, RawCapabilityEvent};
use crate::observer::{LoadOutcome, SceneObserver};
use crate::scheduler::{FrameHandle, FrameScheduler};
use crate::types::{Animation, MAX_SCALE, MIN_SCALE, MarkerState, SceneRuntimeState, Vec3};

type TeardownCallback = Box<dyn FnOnce() + Send>;

pub struct SceneController<R: RenderCapability + 'static> {
    core: Arc<Core<R>>,
}

struct Core<R> {
    render:    R,
    scheduler: Arc<dyn FrameScheduler>,
    observer:  Arc<dyn SceneObserver>,
    config:    SceneConfig,
    inner:     Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    state:                SceneRuntimeState,
    /// Bumped by every mount, load start and load error.
    generation:           u64,
    materials_registered: bool,
    /// A completion, error or timeout already settled the current load.
    load_resolved:        bool,
    rotation_enabled:     bool,
    /// Cumulative factor of the rotate gesture in progress.
    rotate_total:         Option<f32>,
    mounted:              bool,
    torn_down:            bool,
    frame:                Option<FrameHandle>,
    settle:               Option<JoinHandle<()>>,
    load_timeout:         Option<JoinHandle<()>>,
    acquire_timeout:      Option<JoinHandle<()>>,
    on_teardown:          Vec<TeardownCallback>,
}

impl Inner {
    fn abort_settle(&mut self) {
        if let Some(task) = self.settle.take() {
            task.abort();
        }
    }

    fn abort_load_timeout(&mut self) {
        if let Some(task) = self.load_timeout.take() {
            task.abort();
        }
    }

    fn abort_acquire_timeout(&mut self) {
        if let Some(task) = self.acquire_timeout.take() {
            task.abort();
        }
    }
}

enum Notice {
    Loading(bool),
    Loaded(LoadOutcome),
    Error(SceneError),
    Marker(MarkerState),
    TrackingLost,
}

impl<R: RenderCapability + 'static> SceneController<R> {
    pub fn new(
        render: R,
        config: SceneConfig,
        scheduler: Arc<dyn FrameScheduler>,
        observer: Arc<dyn SceneObserver>,
    ) -> Self {
        let inner = Inner {
            rotation_enabled: config.auto_rotate,
            ..Inner::default()
        };
        Self {
            core: Arc::new(Core {
                render,
                scheduler,
                observer,
                config,
                inner: Mutex::new(inner),
            }),
        }
    }

    pub fn render(&self) -> &R {
        &self.core.render
    }

    pub fn config(&self) -> &SceneConfig {
        &self.core.config
    }

    pub fn state(&self) -> SceneRuntimeState {
        self.core.lock().state
    }

    pub fn is_rotating(&self) -> bool {
        self.core
            .lock()
            .frame
            .as_ref()
            .is_some_and(FrameHandle::is_active)
    }

    pub fn is_torn_down(&self) -> bool {
        self.core.lock().torn_down
    }

    /// Start loading `source` and arm the load (and marker) timeouts.
    pub fn mount(&self, source: GeometrySource) -> Result<(), SceneError> {
        let core = &self.core;
        let mut notices = Vec::new();
        let result = {
            let mut inner = core.lock();
            if inner.torn_down {
                return Err(SceneError::load_failure("scene already torn down"));
            }

            inner.mounted = true;
            core.begin_load(&mut inner);
            inner.state.marker_state = MarkerState::Searching;
            tracing::info!(?source, generation = inner.generation, "mounting scene");

            if core.config.marker_tracking {
                let target = &core.config.marker_target;
                if let Err(e) = core.render.register_marker_target(target) {
                    tracing::warn!(error = %e, name = target.name(), "failed to register marker target");
                }
            }

            match core.render.load_object(&source) {
                Ok(()) => {
                    core.push_transform(&inner);
                    if core.config.marker_tracking {
                        inner.abort_acquire_timeout();
                        inner.acquire_timeout = core.spawn_acquire_timeout();
                    }
                    core.sync_rotation(&mut inner);
                    notices.push(Notice::Loading(true));
                    Ok(())
                }
                Err(e) => {
                    let error = SceneError::load_failure(e.to_string());
                    inner.generation += 1;
                    inner.load_resolved = true;
                    inner.abort_load_timeout();
                    notices.push(Notice::Error(error.clone()));
                    Err(error)
                }
            }
        };
        core.emit(notices);
        result
    }

    /// Apply a normalized capability event.
    pub fn handle_event(&self, event: CapabilityEvent) {
        let core = &self.core;
        let mut notices = Vec::new();
        {
            let mut inner = core.lock();
            if inner.torn_down || !inner.mounted {
                tracing::debug!(?event, "scene not mounted, ignoring event");
                return;
            }

            match event {
                CapabilityEvent::LoadStart => {
                    core.begin_load(&mut inner);
                    notices.push(Notice::Loading(true));
                }
                CapabilityEvent::LoadEnd => {
                    inner.state.geometry_loaded = true;
                    inner.load_resolved = true;
                    inner.abort_load_timeout();
                    notices.push(Notice::Loading(false));
                    notices.push(Notice::Loaded(LoadOutcome::Complete));

                    if !inner.materials_registered {
                        if core.config.settle_delay.is_zero() {
                            core.register_materials(&mut inner);
                        } else {
                            inner.abort_settle();
                            inner.settle = core.spawn_settle(inner.generation);
                        }
                    }
                }
                CapabilityEvent::LoadError { message } => {
                    tracing::warn!(%message, "model failed to load");
                    inner.generation += 1;
                    inner.state.geometry_loaded = false;
                    inner.load_resolved = true;
                    inner.abort_settle();
                    inner.abort_load_timeout();
                    notices.push(Notice::Loading(false));
                    notices.push(Notice::Error(SceneError::load_failure(message)));
                }
                CapabilityEvent::AnchorFound => {
                    if !core.config.marker_tracking {
                        tracing::debug!("anchor found outside marker mode");
                    } else {
                        inner.state.marker_state = MarkerState::Found;
                        inner.abort_acquire_timeout();
                        core.sync_rotation(&mut inner);
                        notices.push(Notice::Marker(MarkerState::Found));
                    }
                }
                CapabilityEvent::AnchorUpdated => {}
                CapabilityEvent::AnchorRemoved => {
                    if inner.state.marker_state == MarkerState::Found {
                        inner.state.marker_state = MarkerState::Lost;
                        core.sync_rotation(&mut inner);
                        notices.push(Notice::Marker(MarkerState::Lost));
                        notices.push(Notice::TrackingLost);
                    }
                }
                CapabilityEvent::Pinch { state, factor } => {
                    if factor.is_finite() {
                        let scale = (inner.state.base_scale * factor).clamp(MIN_SCALE, MAX_SCALE);
                        inner.state.scale = Vec3::splat(scale);
                        if state == GestureState::End {
                            inner.state.base_scale = scale;
                        }
                        core.push_transform(&inner);
                    }
                }
                CapabilityEvent::Rotate { state, degrees } => {
                    if degrees.is_finite() {
                        let previous = match state {
                            GestureState::Start => 0.0,
                            _ => inner.rotate_total.unwrap_or(0.0),
                        };
                        inner.rotate_total = (state != GestureState::End).then_some(degrees);
                        inner.state.add_yaw(degrees - previous);
                        core.push_transform(&inner);
                    }
                }
            }
        }
        core.emit(notices);
    }

    /// Normalize and apply an engine callback.
    pub fn handle_raw(&self, raw: &RawCapabilityEvent) -> Result<(), EventError> {
        let event = raw.normalize()?;
        self.handle_event(event);
        Ok(())
    }

    /// Turn the rotation animation on or off.
    ///
    /// In marker mode the animation additionally waits for the marker.
    pub fn set_rotating(&self, enabled: bool) {
        let mut inner = self.core.lock();
        inner.rotation_enabled = enabled;
        self.core.sync_rotation(&mut inner);
    }

    /// Run `callback` once when the scene is torn down.
    ///
    /// Runs immediately if that already happened.
    pub fn on_teardown(&self, callback: impl FnOnce() + Send + 'static) {
        let mut inner = self.core.lock();
        if inner.torn_down {
            drop(inner);
            callback();
        } else {
            inner.on_teardown.push(Box::new(callback));
        }
    }

    /// Stop every timer and loop, dispose the capability and run the
    /// teardown callbacks. Later calls do nothing.
    pub fn teardown(&self) {
        self.core.teardown();
    }
}

impl<R: RenderCapability + 'static> Drop for SceneController<R> {
    fn drop(&mut self) {
        self.core.teardown();
    }
}

impl<R: RenderCapability + 'static> Core<R> {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, notices: Vec<Notice>) {
        for notice in notices {
            match notice {
                Notice::Loading(loading) => self.observer.on_loading(loading),
                Notice::Loaded(outcome) => self.observer.on_loaded(outcome),
                Notice::Error(error) => self.observer.on_error(&error),
                Notice::Marker(state) => self.observer.on_marker(state),
                Notice::TrackingLost => self.observer.on_tracking_lost(),
            }
        }
    }

    fn begin_load(self: &Arc<Self>, inner: &mut Inner) {
        inner.generation += 1;
        inner.state.geometry_loaded = false;
        inner.materials_registered = false;
        inner.load_resolved = false;
        inner.abort_settle();
        inner.abort_load_timeout();
        inner.load_timeout = self.spawn_load_timeout(inner.generation);
    }

    fn push_transform(&self, inner: &Inner) {
        if let Err(e) = self.render.set_transform(&inner.state.transform()) {
            tracing::warn!(error = %e, "failed to update transform");
        }
    }

    /// Materials and animations, at most once per load and only on loaded geometry.
    fn register_materials(&self, inner: &mut Inner) {
        if !inner.state.geometry_loaded || inner.materials_registered {
            return;
        }
        inner.materials_registered = true;

        if let Err(e) = self.render.create_materials(&self.config.materials) {
            tracing::warn!(error = %e, "failed to create materials");
        }
        let period_ms = self.config.rotation_period.as_millis() as u64;
        if let Err(e) = self.render.register_animations(&Animation::turntable(period_ms)) {
            tracing::warn!(error = %e, "failed to register animations");
        }
        tracing::debug!(generation = inner.generation, "materials registered");
    }

    fn should_rotate(&self, inner: &Inner) -> bool {
        inner.mounted
            && !inner.torn_down
            && inner.rotation_enabled
            && (!self.config.marker_tracking || inner.state.marker_state == MarkerState::Found)
    }

    fn sync_rotation(self: &Arc<Self>, inner: &mut Inner) {
        let running = inner.frame.as_ref().is_some_and(FrameHandle::is_active);
        match (self.should_rotate(inner), running) {
            (true, false) => {
                let weak = Arc::downgrade(self);
                inner.frame = Some(self.scheduler.start(Box::new(move |delta| {
                    if let Some(core) = weak.upgrade() {
                        core.on_frame(delta);
                    }
                })));
                tracing::debug!("rotation started");
            }
            (false, true) => {
                if let Some(mut frame) = inner.frame.take() {
                    frame.stop();
                }
                tracing::debug!(yaw = inner.state.rotation.y, "rotation stopped");
            }
            _ => {}
        }
    }

    fn on_frame(&self, delta: Duration) {
        let mut inner = self.lock();
        if !inner.frame.as_ref().is_some_and(FrameHandle::is_active) {
            return;
        }
        let step = self.config.yaw_step(delta);
        inner.state.add_yaw(step);
        self.push_transform(&inner);
    }

    fn spawn_settle(self: &Arc<Self>, generation: u64) -> Option<JoinHandle<()>> {
        let delay = self.config.settle_delay;
        self.spawn_timer(delay, move |core, inner| {
            if inner.generation == generation {
                core.register_materials(inner);
            }
            Vec::new()
        })
    }

    fn spawn_load_timeout(self: &Arc<Self>, generation: u64) -> Option<JoinHandle<()>> {
        let timeout = self.config.load_timeout;
        self.spawn_timer(timeout, move |_, inner| {
            if inner.generation != generation || inner.load_resolved {
                return Vec::new();
            }
            tracing::warn!(?timeout, "no load outcome, assuming the object is visible");
            inner.load_resolved = true;
            vec![Notice::Loading(false), Notice::Loaded(LoadOutcome::BestEffort)]
        })
    }

    fn spawn_acquire_timeout(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        let timeout = self.config.acquire_timeout;
        self.spawn_timer(timeout, move |_, inner| {
            if inner.state.marker_state != MarkerState::Searching {
                return Vec::new();
            }
            tracing::warn!(?timeout, "marker not acquired");
            vec![Notice::Error(SceneError::not_acquired(format!(
                "no marker found within {}s",
                timeout.as_secs()
            )))]
        })
    }

    /// Run `fire` after `delay` unless the controller is gone or torn down.
    fn spawn_timer<F>(self: &Arc<Self>, delay: Duration, fire: F) -> Option<JoinHandle<()>>
    where
        F: FnOnce(&Core<R>, &mut Inner) -> Vec<Notice> + Send + 'static,
    {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("no tokio runtime, scene timer disabled");
            return None;
        };
        let weak: Weak<Self> = Arc::downgrade(self);
        Some(runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(core) = weak.upgrade() else {
                return;
            };
            let notices = {
                let mut inner = core.lock();
                if inner.torn_down {
                    return;
                }
                fire(&core, &mut inner)
            };
            core.emit(notices);
        }))
    }

    fn teardown(&self) {
        let callbacks = {
            let mut inner = self.lock();
            if inner.torn_down {
                return;
            }
            inner.torn_down = true;
            if let Some(mut frame) = inner.frame.take() {
                frame.stop();
            }
            inner.abort_settle();
            inner.abort_load_timeout();
            inner.abort_acquire_timeout();
            std::mem::take(&mut inner.on_teardown)
        };

        self.render.dispose();
        for callback in callbacks {
            callback();
        }
        tracing::info!("scene torn down");
    }
}
