//! Immutable data types shared by the fetcher and its callers.

pub mod model;
pub mod options;
pub mod progress;

pub use model::{ModelReference, ModelStatus};
pub use options::{FetchOptions, FetchPhase};
pub use progress::Progress;
