use std::fmt;
use std::path::{Path, PathBuf};

use url::Url;

use crate::error::{Result, ValidationError};

/// Where a normalized reference lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// Already on this device; resolved without copying.
    Local(PathBuf),
    /// Must be downloaded into the cache first.
    Remote(Url),
}

impl Locator {
    /// Classify `uri` as a local file or a remote download.
    ///
    /// Accepts `file://` URLs, absolute filesystem paths and `http(s)` URLs.
    pub fn parse(uri: &str) -> Result<Self> {
        let uri = uri.trim();
        if Path::new(uri).is_absolute() {
            return Ok(Self::Local(PathBuf::from(uri)));
        }

        let url = Url::parse(uri)
            .map_err(|e| ValidationError::invalid(format!("not an absolute URL ({e})")))?;
        match url.scheme() {
            "file" => url
                .to_file_path()
                .map(Self::Local)
                .map_err(|()| ValidationError::invalid("file URL has no usable path")),
            "http" | "https" => Ok(Self::Remote(url)),
            other => Err(ValidationError::UnsupportedUrlScheme {
                scheme: other.to_string(),
            }),
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local(_))
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(path) => write!(f, "{}", path.display()),
            Self::Remote(url) => write!(f, "{url}"),
        }
    }
}
