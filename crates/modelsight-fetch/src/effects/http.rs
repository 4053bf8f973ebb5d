use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::Stream;

/// A boxed stream type for HTTP response bodies.
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// An opened response body.
pub struct RemoteBody<E> {
    /// Size of the complete resource, if the server announced it.
    pub total_bytes: Option<u64>,

    /// Byte offset the body starts at.
    ///
    /// Equals the requested range start when the server honoured the range,
    /// and `0` when it sent the whole resource instead.
    pub offset: u64,

    pub stream: BoxStream<'static, Result<Bytes, E>>,
}

/// Asynchronous HTTP client abstraction.
///
/// This is the minimal transport surface the cache needs. Implementations
/// handle redirects, timeouts and mapping non-success statuses to errors.
///
/// # Implementations
///
/// - [`ReqwestClient`]: production implementation using `reqwest`
/// - in-memory mocks in tests
pub trait HttpClient: Send + Sync {
    /// Error type for transport operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Open a streaming GET.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to fetch
    /// * `headers` - Custom headers to include with the request
    /// * `range_start` - Ask for the resource starting at this byte offset
    fn stream(
        &self,
        url: &str,
        headers: &[(String, String)],
        range_start: Option<u64>,
    ) -> impl Future<Output = Result<RemoteBody<Self::Error>, Self::Error>> + Send;

    /// Whether `error` means the requested range starts past the end of the
    /// resource (HTTP 416). The fetcher then discards its partial copy and
    /// downloads from the start.
    fn is_range_not_satisfiable(_error: &Self::Error) -> bool {
        false
    }
}

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use std::time::Duration;

    use reqwest::StatusCode;
    use reqwest::header::{CONTENT_RANGE, RANGE};

    use super::*;

    /// Production HTTP client implementation using reqwest.
    #[derive(Debug, Clone)]
    pub struct ReqwestClient {
        client: reqwest::Client,
    }

    impl ReqwestClient {
        pub fn new() -> Result<Self, reqwest::Error> {
            Ok(Self {
                client: reqwest::Client::builder().build()?,
            })
        }

        /// Client that gives up on unreachable hosts and stalled bodies.
        pub fn with_timeouts(connect: Duration, read: Duration) -> Result<Self, reqwest::Error> {
            let client = reqwest::Client::builder()
                .connect_timeout(connect)
                .read_timeout(read)
                .build()?;
            Ok(Self { client })
        }
    }

    impl HttpClient for ReqwestClient {
        type Error = reqwest::Error;

        async fn stream(
            &self,
            url: &str,
            headers: &[(String, String)],
            range_start: Option<u64>,
        ) -> Result<RemoteBody<Self::Error>, Self::Error> {
            let mut request = self.client.get(url);
            for (key, value) in headers {
                request = request.header(key, value);
            }
            if let Some(start) = range_start.filter(|s| *s > 0) {
                request = request.header(RANGE, format!("bytes={start}-"));
            }

            let response = request.send().await?.error_for_status()?;

            let (offset, total_bytes) = match range_start {
                Some(start) if response.status() == StatusCode::PARTIAL_CONTENT => {
                    let total = response
                        .headers()
                        .get(CONTENT_RANGE)
                        .and_then(|v| v.to_str().ok())
                        .and_then(total_from_content_range)
                        .or_else(|| response.content_length().map(|len| len + start));
                    (start, total)
                }
                _ => (0, response.content_length()),
            };

            Ok(RemoteBody {
                total_bytes,
                offset,
                stream: Box::pin(response.bytes_stream()),
            })
        }

        fn is_range_not_satisfiable(error: &Self::Error) -> bool {
            error.status() == Some(StatusCode::RANGE_NOT_SATISFIABLE)
        }
    }

    /// `bytes 100-199/200` → `Some(200)`; `*` totals are unknown.
    fn total_from_content_range(value: &str) -> Option<u64> {
        value.rsplit_once('/')?.1.trim().parse().ok()
    }

    #[cfg(test)]
    mod tests {
        use super::total_from_content_range;

        #[test]
        fn test_total_from_content_range() {
            assert_eq!(total_from_content_range("bytes 100-199/200"), Some(200));
            assert_eq!(total_from_content_range("bytes 0-0/*"), None);
            assert_eq!(total_from_content_range("garbage"), None);
        }
    }
}

#[cfg(feature = "reqwest")]
pub use reqwest_impl::ReqwestClient;
