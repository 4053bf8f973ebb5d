//! Drives one scan-to-render session.
//!
//! The controller owns the [`SessionMachine`] and sequences validation, asset
//! resolution and scene mounting around it. Work that suspends (resolution)
//! re-checks a liveness flag and a scan epoch before touching state, so
//! results that arrive after [`SessionController::exit`] or for a superseded
//! scan are dropped.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use modelsight_fetch::{AssetCache, FetchOptions, HttpClient, ModelReference, Progress};
use modelsight_reference::{ReferenceValidator, ScanPayload};
use modelsight_scene::{GeometrySource, LoadOutcome, SceneError, SceneObserver};

use crate::error::{SessionError, TransitionError};
use crate::hooks::{HookRegistry, HookToken};
use crate::machine::{SessionEvent, SessionMachine};
use crate::observer::SessionObserver;
use crate::persistence::{KeyValueStore, ModelMetadata, SessionPersistence};
use crate::state::{MAX_ERRORS, Phase, SessionState};

/// Knobs for a [`SessionController`].
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub validator:  ReferenceValidator,
    /// Consecutive counted failures before starting over.
    ///
    /// Default: 3
    pub max_errors: u32,
    /// Passed to every download; a progress callback set here still fires.
    pub fetch:      FetchOptions,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            validator:  ReferenceValidator::default(),
            max_errors: MAX_ERRORS,
            fetch:      FetchOptions::default(),
        }
    }
}

impl SessionOptions {
    #[must_use]
    pub fn validator(mut self, validator: ReferenceValidator) -> Self {
        self.validator = validator;
        self
    }

    #[must_use]
    pub fn max_errors(mut self, max_errors: u32) -> Self {
        self.max_errors = max_errors;
        self
    }

    #[must_use]
    pub fn fetch(mut self, fetch: FetchOptions) -> Self {
        self.fetch = fetch;
        self
    }
}

/// What happened to a submitted payload.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The model is on disk and the session is `Ready`.
    Ready(ModelMetadata),
    /// Validation rejected the payload; the session waits for a rescan.
    Rejected(SessionError),
    /// Resolution failed.
    Failed(SessionError),
    /// Another payload is still being processed.
    Busy,
    /// The session is not scanning.
    NotScanning(Phase),
    /// The session exited (or moved on) while the payload was processed.
    Cancelled,
}

pub struct SessionController<C, S>
where
    C: HttpClient + 'static,
    S: KeyValueStore + 'static,
{
    shared: Arc<Shared<C, S>>,
}

impl<C, S> Clone for SessionController<C, S>
where
    C: HttpClient + 'static,
    S: KeyValueStore + 'static,
{
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

struct Shared<C: HttpClient, S> {
    machine:     Mutex<SessionMachine>,
    validator:   ReferenceValidator,
    cache:       AssetCache<C>,
    persistence: SessionPersistence<S>,
    observer:    Arc<dyn SessionObserver>,
    fetch:       FetchOptions,
    current:     Mutex<Option<ModelReference>>,
    hook:        Mutex<Option<(Arc<HookRegistry<dyn SceneObserver>>, HookToken)>>,
    in_flight:   AtomicBool,
    epoch:       AtomicU64,
    alive:       AtomicBool,
}

/// Releases the single-flight flag on every exit path, including a dropped future.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<C, S> SessionController<C, S>
where
    C: HttpClient + 'static,
    S: KeyValueStore + 'static,
{
    pub fn new(
        cache: AssetCache<C>,
        store: S,
        options: SessionOptions,
        observer: Arc<dyn SessionObserver>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                machine: Mutex::new(SessionMachine::new(options.max_errors)),
                validator: options.validator,
                cache,
                persistence: SessionPersistence::new(store),
                observer,
                fetch: options.fetch,
                current: Mutex::new(None),
                hook: Mutex::new(None),
                in_flight: AtomicBool::new(false),
                epoch: AtomicU64::new(0),
                alive: AtomicBool::new(true),
            }),
        }
    }

    pub fn state(&self) -> SessionState {
        lock(&self.shared.machine).state().clone()
    }

    pub fn is_alive(&self) -> bool {
        self.shared.alive.load(Ordering::SeqCst)
    }

    /// The reference of the current scan, if any.
    pub fn current_reference(&self) -> Option<ModelReference> {
        lock(&self.shared.current).clone()
    }

    pub fn cache(&self) -> &AssetCache<C> {
        &self.shared.cache
    }

    pub fn persistence(&self) -> &SessionPersistence<S> {
        &self.shared.persistence
    }

    /// Validate `payload` and resolve the model it names.
    ///
    /// Only one payload is processed at a time; others are dropped with
    /// [`SubmitOutcome::Busy`].
    pub async fn submit(&self, payload: ScanPayload) -> SubmitOutcome {
        let shared = &self.shared;
        if !shared.is_alive() {
            return SubmitOutcome::Cancelled;
        }
        if shared.in_flight.swap(true, Ordering::SeqCst) {
            tracing::debug!("scan dropped, another payload is in flight");
            return SubmitOutcome::Busy;
        }
        let _in_flight = InFlight(&shared.in_flight);

        if let Err(TransitionError::Illegal { phase, .. }) = shared.apply(SessionEvent::Scan) {
            tracing::debug!(%phase, "scan dropped, session is not scanning");
            return SubmitOutcome::NotScanning(phase);
        }
        let epoch = shared.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::info!(text = %payload.text, epoch, "payload scanned");

        let reference = match shared.validator.validate(&payload.text) {
            Ok(reference) => reference,
            Err(e) => {
                let error = SessionError::from(&e);
                tracing::warn!(%error, "payload rejected");
                let _ = shared.apply(SessionEvent::Rejected(error.clone()));
                shared.observer.on_error(&error);
                return SubmitOutcome::Rejected(error);
            }
        };

        let _ = shared.apply(SessionEvent::Accepted);
        let mut model = ModelReference::new(&reference.uri);
        model.begin_download();
        *lock(&shared.current) = Some(model);

        let options = Shared::progress_options(shared, epoch);
        let result = shared.cache.resolve(&reference.uri, &options).await;

        if !shared.is_current(epoch) {
            tracing::debug!(epoch, "session moved on, dropping resolution result");
            return SubmitOutcome::Cancelled;
        }

        match result {
            Ok(path) => {
                let metadata = ModelMetadata::scanned(&reference.uri, &path);
                if let Err(e) = shared.persistence.save(&metadata) {
                    tracing::warn!(error = %e, "failed to persist current model");
                }
                if let Some(model) = lock(&shared.current).as_mut() {
                    model.mark_ready(&path);
                }
                let _ = shared.apply(SessionEvent::Resolved);
                shared.observer.on_ready(&metadata);
                SubmitOutcome::Ready(metadata)
            }
            Err(e) => {
                let error = SessionError::from(&e);
                tracing::warn!(%error, "model resolution failed");
                if let Some(model) = lock(&shared.current).as_mut() {
                    model.mark_failed();
                }
                let _ = shared.apply(SessionEvent::FetchFailed(error.clone()));
                shared.observer.on_error(&error);
                SubmitOutcome::Failed(error)
            }
        }
    }

    /// Move from `Ready` to `Rendering` and return what the scene should load.
    ///
    /// Falls back to the bundled model when no reference is active.
    pub fn begin_rendering(&self) -> Result<GeometrySource, TransitionError> {
        self.shared.apply(SessionEvent::Mounted)?;
        let path: Option<PathBuf> = lock(&self.shared.current)
            .as_ref()
            .and_then(|model| model.local_path().map(PathBuf::from));
        Ok(path.map_or(GeometrySource::Bundled, GeometrySource::file))
    }

    /// Manual recovery from `Error`.
    pub fn rescan(&self) -> Result<Phase, TransitionError> {
        let phase = self.shared.apply(SessionEvent::Rescan)?;
        *lock(&self.shared.current) = None;
        Ok(phase)
    }

    /// Observer to hand to the scene of the current model.
    ///
    /// Scene notifications only reach this session while it is alive and
    /// still on the scan the observer was created for.
    pub fn scene_observer(&self) -> Arc<dyn SceneObserver> {
        Arc::new(SceneBridge {
            shared: Arc::downgrade(&self.shared),
            epoch:  self.shared.epoch.load(Ordering::SeqCst),
        })
    }

    /// Install [`Self::scene_observer`] into a shared registry. The slot is
    /// cleared on [`Self::exit`] if it still holds this session's handler.
    pub fn install_scene_hook(&self, registry: Arc<HookRegistry<dyn SceneObserver>>) -> HookToken {
        let token = registry.install(self.scene_observer());
        let previous = lock(&self.shared.hook).replace((registry, token));
        if let Some((registry, token)) = previous {
            registry.clear(token);
        }
        token
    }

    /// Tear the session down. Pending work is ignored when it completes.
    pub fn exit(&self) {
        let shared = &self.shared;
        if !shared.alive.swap(false, Ordering::SeqCst) {
            return;
        }
        shared.epoch.fetch_add(1, Ordering::SeqCst);

        if let Some((registry, token)) = lock(&shared.hook).take() {
            if !registry.clear(token) {
                tracing::debug!("scene hook was replaced by another session, leaving it");
            }
        }
        *lock(&shared.current) = None;

        let state = {
            let mut machine = lock(&shared.machine);
            machine.reset();
            machine.state().clone()
        };
        shared.observer.on_state(&state);
        tracing::info!("session exited");
    }
}

impl<C: HttpClient + 'static, S: KeyValueStore + 'static> Shared<C, S> {
    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.is_alive() && self.epoch.load(Ordering::SeqCst) == epoch
    }

    /// Apply `event` and tell the observer about the new state.
    fn apply(&self, event: SessionEvent) -> Result<Phase, TransitionError> {
        let state = {
            let mut machine = lock(&self.machine);
            let phase = machine.apply(event)?;
            tracing::info!(%phase, "session phase");
            machine.state().clone()
        };
        self.observer.on_state(&state);
        Ok(state.phase)
    }

    /// Fetch options whose progress also lands on the session.
    fn progress_options(this: &Arc<Self>, epoch: u64) -> FetchOptions {
        let weak = Arc::downgrade(this);
        let inner = this.fetch.on_progress.clone();
        this.fetch.clone().on_progress(Arc::new(move |progress: &Progress| {
            if let Some(callback) = &inner {
                callback(progress);
            }
            let Some(shared) = weak.upgrade() else {
                return;
            };
            if !shared.is_current(epoch) {
                return;
            }
            let fraction = lock(&shared.current)
                .as_mut()
                .map(|model| model.record_progress(progress.fraction));
            if let Some(fraction) = fraction {
                shared.observer.on_progress(fraction);
            }
        }))
    }
}

/// Routes scene notifications into the session machine.
struct SceneBridge<C: HttpClient, S> {
    shared: Weak<Shared<C, S>>,
    epoch:  u64,
}

impl<C, S> SceneBridge<C, S>
where
    C: HttpClient + 'static,
    S: KeyValueStore + 'static,
{
    fn live(&self) -> Option<Arc<Shared<C, S>>> {
        self.shared
            .upgrade()
            .filter(|shared| shared.is_current(self.epoch))
    }
}

impl<C, S> SceneObserver for SceneBridge<C, S>
where
    C: HttpClient + 'static,
    S: KeyValueStore + 'static,
{
    fn on_loading(&self, loading: bool) {
        if let Some(shared) = self.live() {
            shared.observer.on_loading(loading);
        }
    }

    fn on_loaded(&self, outcome: LoadOutcome) {
        let Some(shared) = self.live() else {
            return;
        };
        if outcome == LoadOutcome::Complete {
            if let Err(e) = shared.apply(SessionEvent::LoadCompleted) {
                tracing::debug!(error = %e, "load completion outside rendering");
            }
        }
        shared.observer.on_scene_loaded(outcome);
    }

    fn on_error(&self, error: &SceneError) {
        let Some(shared) = self.live() else {
            return;
        };
        let error = SessionError::from(error);
        match shared.apply(SessionEvent::SceneFailed(error.clone())) {
            Ok(_) => shared.observer.on_error(&error),
            Err(e) => tracing::debug!(error = %e, "scene error outside rendering"),
        }
    }

    fn on_tracking_lost(&self) {
        if let Some(shared) = self.live() {
            tracing::info!("marker tracking lost");
            shared.observer.on_tracking_lost();
        }
    }
}
