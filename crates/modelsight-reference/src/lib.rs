//! Scanned-code decoding and model reference validation.
//!
//! - [`decoder`] - debounced decoding of camera captures into [`ScanPayload`]s
//! - [`validator`] - pure rules deciding whether a payload names a 3D asset
//! - [`Locator`] - local-vs-remote classification used by the asset cache

pub mod decoder;
pub mod validator;

mod error;
mod format;
mod locator;
mod payload;

pub use decoder::{CodeDecoder, CodeDetector, DEFAULT_DEBOUNCE};
pub use error::{DecodeError, Result, ValidationError};
pub use format::ModelFormat;
pub use locator::Locator;
pub use payload::{Capture, CodeKind, DetectedCode, ScanPayload};
pub use validator::{
    MODEL_QUERY_KEYS, ReferenceOrigin, ReferenceValidator, ValidatedReference, ValidatorOptions,
    validate,
};
