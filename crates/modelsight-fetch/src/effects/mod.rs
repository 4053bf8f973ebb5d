//! I/O side of the crate: transport, staging and the cache.

mod cache;
mod fetcher;
mod http;

pub use cache::AssetCache;
pub use fetcher::Fetcher;
pub use http::{BoxStream, HttpClient, RemoteBody};
#[cfg(feature = "reqwest")]
pub use http::ReqwestClient;
