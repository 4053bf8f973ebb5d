//! Model asset resolution: local references, cached downloads and resume.
//!
//! # Architecture
//!
//! - [`data`] - options, progress snapshots and the [`ModelReference`] record
//! - [`core`] - pure pieces: cache naming and the monotonic progress gate
//! - [`effects`] - transport port, resumable [`Fetcher`] and [`AssetCache`]
//!
//! Writes stay inside the cache directory. Partial downloads are staged under
//! `models/.staging` and only become visible by rename.

pub mod core;
pub mod data;
pub mod effects;

mod error;

pub use crate::core::{ProgressGate, cache_file_name, sanitize_segment};
pub use data::{FetchOptions, FetchPhase, ModelReference, ModelStatus, Progress};
pub use effects::{AssetCache, BoxStream, Fetcher, HttpClient, RemoteBody};
pub use error::{BoxError, DownloadCause, Error, Result};

#[cfg(feature = "reqwest")]
pub use effects::ReqwestClient;
