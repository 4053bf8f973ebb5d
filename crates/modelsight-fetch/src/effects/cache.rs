use std::path::{Path, PathBuf};

use modelsight_reference::Locator;
use url::Url;

use crate::core::cache_file_name;
use crate::data::{FetchOptions, ModelReference};
use crate::effects::fetcher::Fetcher;
use crate::effects::http::HttpClient;
use crate::error::{Error, Result};

/// Resolves model references to readable local files.
///
/// Remote assets land in `<cache_root>/models/` under a name derived from the
/// URL, so resolving the same reference twice downloads it once. Nothing in
/// the cache is ever deleted by this type.
pub struct AssetCache<C: HttpClient> {
    fetcher:    Fetcher<C>,
    models_dir: PathBuf,
}

impl<C: HttpClient> AssetCache<C> {
    pub fn new(client: C, cache_root: impl AsRef<Path>) -> Self {
        let models_dir = cache_root.as_ref().join("models");
        Self {
            fetcher: Fetcher::new(client, models_dir.join(".staging")),
            models_dir,
        }
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    pub fn client(&self) -> &C {
        self.fetcher.client()
    }

    /// Where `url` is (or would be) cached.
    pub fn cache_path(&self, url: &Url) -> PathBuf {
        self.models_dir.join(cache_file_name(url))
    }

    /// Resolve `uri` to a local file.
    ///
    /// Local references are checked for existence and returned unchanged.
    /// Remote references are served from the cache when a non-empty copy
    /// exists, without touching the network or the progress callback;
    /// otherwise they are downloaded.
    pub async fn resolve(&self, uri: &str, options: &FetchOptions) -> Result<PathBuf> {
        match Locator::parse(uri)? {
            Locator::Local(path) => {
                if path.is_file() {
                    tracing::debug!(path = %path.display(), "using local model");
                    Ok(path)
                } else {
                    Err(Error::LocalFileNotFound(path))
                }
            }
            Locator::Remote(url) => {
                modelsight_fs::ensure_dir(&self.models_dir).map_err(Error::Cache)?;
                let destination = self.cache_path(&url);
                if modelsight_fs::is_nonempty_file(&destination) {
                    tracing::info!(url = %url, path = %destination.display(), "cache hit");
                    return Ok(destination);
                }

                tracing::info!(url = %url, "downloading model");
                self.fetcher.fetch(&url, &destination, options).await
            }
        }
    }

    /// Resolve `reference`, recording status and progress on it.
    ///
    /// Per-chunk progress is still delivered through `options`; the
    /// reference moves from `Downloading` straight to `Ready` or `Failed`.
    pub async fn resolve_reference(
        &self,
        reference: &mut ModelReference,
        options: &FetchOptions,
    ) -> Result<PathBuf> {
        reference.begin_download();
        match self.resolve(reference.source_uri(), options).await {
            Ok(path) => {
                reference.mark_ready(&path);
                Ok(path)
            }
            Err(e) => {
                tracing::warn!(uri = reference.source_uri(), error = %e, "model resolution failed");
                reference.mark_failed();
                Err(e)
            }
        }
    }
}
