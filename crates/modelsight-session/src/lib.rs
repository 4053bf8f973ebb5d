//! Session control from a scanned code to a rendered model.
//!
//! - [`SessionMachine`] - the pure transition table with a bounded error budget
//! - [`SessionController`] - runs validation and resolution around the machine
//!   and bridges scene notifications back into it
//! - [`SessionPersistence`] - the `currentModelUri` / `currentModelMetadata` slots
//! - [`HookRegistry`] - a shared handler slot with generation-checked teardown

mod controller;
mod error;
mod hooks;
mod machine;
mod observer;
mod persistence;
mod state;

pub use controller::{SessionController, SessionOptions, SubmitOutcome};
pub use error::{ErrorKind, Result, SessionError, StoreError, TransitionError};
pub use hooks::{HookRegistry, HookToken};
pub use machine::{SessionEvent, SessionMachine};
pub use observer::{NoopObserver, SessionObserver};
pub use persistence::{
    CURRENT_MARKER_IMAGE, CURRENT_MODEL_METADATA, CURRENT_MODEL_URI, JsonFileStore, KeyValueStore,
    MemoryStore, ModelMetadata, SessionPersistence,
};
pub use state::{MAX_ERRORS, Phase, SessionState};
