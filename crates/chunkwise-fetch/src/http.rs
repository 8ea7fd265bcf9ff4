use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::Stream;

use crate::error::Result;

/// A boxed stream of response body pieces.
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// Body of a successful response, yielded piece by piece.
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

/// Asynchronous HTTP client abstraction.
///
/// This is the whole network surface the chunk fetcher needs: a small text body
/// for the manifest and a streamed body for each chunk. Implementations must
/// report non-2xx responses as [`TransportError::Status`] rather than handing
/// back an error page as data.
///
/// # Implementations
///
/// - [`ReqwestClient`]: production implementation using `reqwest`
/// - [`MockClient`]: in-memory objects for tests
///
/// [`TransportError::Status`]: crate::TransportError::Status
/// [`ReqwestClient`]: crate::ReqwestClient
/// [`MockClient`]: crate::MockClient
pub trait HttpClient: Send + Sync {
    /// Fetch a whole response body as text.
    fn get_text(&self, url: &str) -> impl Future<Output = Result<String>> + Send;

    /// Open a streaming GET and return the response body.
    ///
    /// The status line has already been checked when this resolves; errors in
    /// the stream are interruptions of an otherwise successful response.
    fn stream(&self, url: &str) -> impl Future<Output = Result<ByteStream>> + Send;
}

impl<C: HttpClient> HttpClient for &C {
    fn get_text(&self, url: &str) -> impl Future<Output = Result<String>> + Send {
        (**self).get_text(url)
    }

    fn stream(&self, url: &str) -> impl Future<Output = Result<ByteStream>> + Send {
        (**self).stream(url)
    }
}

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use std::time::Duration;

    use futures_util::TryStreamExt;

    use super::*;
    use crate::TransportError;
    use crate::url::is_success;

    /// Production HTTP client implementation using reqwest.
    #[derive(Clone)]
    pub struct ReqwestClient {
        client: reqwest::Client,
    }

    impl ReqwestClient {
        pub fn new() -> Result<Self> { Self::with_connect_timeout(None) }

        /// Build a client whose connection attempts give up after `timeout`.
        ///
        /// No overall request timeout is set: a multi-gigabyte chunk may
        /// legitimately take a long time to stream.
        pub fn with_connect_timeout(timeout: Option<Duration>) -> Result<Self> {
            let mut builder = reqwest::Client::builder()
                .user_agent(concat!("chunkwise/", env!("CARGO_PKG_VERSION")));
            if let Some(timeout) = timeout {
                builder = builder.connect_timeout(timeout);
            }
            let client = builder.build().map_err(|e| TransportError::Connection {
                url:     String::new(),
                message: e.to_string(),
            })?;
            Ok(Self { client })
        }

        pub fn from_client(client: reqwest::Client) -> Self { Self { client } }

        async fn get(&self, url: &str) -> Result<reqwest::Response> {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| map_request_error(url, e))?;

            let status = response.status().as_u16();
            if !is_success(status) {
                return Err(TransportError::Status {
                    url: url.to_string(),
                    status,
                });
            }
            Ok(response)
        }
    }

    fn map_request_error(url: &str, e: reqwest::Error) -> TransportError {
        if e.is_builder() {
            TransportError::InvalidUrl(url.to_string())
        } else {
            TransportError::Connection {
                url:     url.to_string(),
                message: e.to_string(),
            }
        }
    }

    impl HttpClient for ReqwestClient {
        async fn get_text(&self, url: &str) -> Result<String> {
            let response = self.get(url).await?;
            let body = response.bytes().await.map_err(|e| TransportError::Body {
                url:     url.to_string(),
                message: e.to_string(),
            })?;
            String::from_utf8(body.to_vec()).map_err(|_| TransportError::InvalidText {
                url: url.to_string(),
            })
        }

        async fn stream(&self, url: &str) -> Result<ByteStream> {
            let response = self.get(url).await?;
            tracing::debug!(url, content_length = ?response.content_length(), "streaming response");

            let url = url.to_string();
            let stream = response.bytes_stream().map_err(move |e| TransportError::Body {
                url:     url.clone(),
                message: e.to_string(),
            });
            Ok(Box::pin(stream))
        }
    }
}

#[cfg(feature = "reqwest")]
pub use reqwest_impl::ReqwestClient;
