//! Pure transformations: cache naming and progress bookkeeping.

mod gate;
mod naming;

pub use gate::ProgressGate;
pub use naming::{cache_file_name, sanitize_segment};
