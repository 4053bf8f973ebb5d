use std::fmt;
use std::sync::Arc;

use super::progress::Progress;

/// Phases of a download operation.
///
/// Downloads progress through these phases in order:
/// Connecting → Downloading → Verifying → Committing → Completed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchPhase {
    /// Request sent, waiting for the response body.
    #[default]
    Connecting,

    /// Streaming chunks into the staging file.
    Downloading,

    /// Checking the staged file exists, is non-empty and complete.
    Verifying,

    /// Moving the staged file into the cache.
    Committing,

    /// Terminal state for successful downloads.
    Completed,
}

impl fmt::Display for FetchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchPhase::Connecting => write!(f, "Connecting"),
            FetchPhase::Downloading => write!(f, "Downloading"),
            FetchPhase::Verifying => write!(f, "Verifying"),
            FetchPhase::Committing => write!(f, "Committing"),
            FetchPhase::Completed => write!(f, "Completed"),
        }
    }
}

/// Configuration for a single resolve/fetch call.
///
/// # Examples
///
/// ```
/// use modelsight_fetch::{FetchOptions, Progress};
/// use std::sync::Arc;
///
/// let options = FetchOptions::default()
///     .header("User-Agent", "modelsight/0.1")
///     .on_progress(Arc::new(|p: &Progress| println!("{}%", p.percent())));
/// ```
#[derive(Clone)]
pub struct FetchOptions {
    /// Custom HTTP headers sent with every request.
    ///
    /// Default: empty
    pub headers: Arc<[(String, String)]>,

    /// Progress callback.
    ///
    /// Invoked on phase transitions and after every chunk written. The
    /// reported fraction never decreases within one download and the final
    /// report of a successful download is exactly `1.0`. Cache hits never
    /// invoke it.
    ///
    /// Default: None
    pub on_progress: Option<Arc<dyn Fn(&Progress) + Send + Sync>>,

    /// Keep partial data on failure and continue with a range request next
    /// time the same reference is fetched.
    ///
    /// Default: true
    pub resume: bool,
}

impl fmt::Debug for FetchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchOptions")
            .field("headers", &self.headers)
            .field("on_progress", &self.on_progress.as_ref().map(|_| "{ ... }"))
            .field("resume", &self.resume)
            .finish()
    }
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            headers:     Arc::new([]),
            on_progress: None,
            resume:      true,
        }
    }
}

impl FetchOptions {
    /// Add a single custom HTTP header.
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut headers: Vec<_> = self.headers.iter().cloned().collect();
        headers.push((key.into(), value.into()));
        self.headers = Arc::from(headers);
        self
    }

    /// Replace all custom headers.
    #[must_use]
    pub fn headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.headers = Arc::from(headers);
        self
    }

    #[must_use]
    pub fn on_progress(mut self, on_progress: Arc<dyn Fn(&Progress) + Send + Sync>) -> Self {
        self.on_progress = Some(on_progress);
        self
    }

    #[must_use]
    pub fn resume(mut self, resume: bool) -> Self {
        self.resume = resume;
        self
    }
}
