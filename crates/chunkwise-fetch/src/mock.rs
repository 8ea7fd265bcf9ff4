use std::collections::HashMap;
use std::sync::Mutex;

use bytes::Bytes;

use crate::error::{Result, TransportError};
use crate::http::{ByteStream, HttpClient};

#[derive(Clone, Debug)]
enum Object {
    Body(Bytes),
    /// Streams the body, then fails as if the connection dropped.
    Truncated(Bytes),
    Status(u16),
    Unreachable,
}

/// In-memory [`HttpClient`] for tests.
///
/// Objects are served from a map keyed by full URL; unknown URLs answer 404.
/// Every request is recorded so tests can assert how many downloads happened.
#[derive(Debug, Default)]
pub struct MockClient {
    objects:    Mutex<HashMap<String, Object>>,
    requests:   Mutex<Vec<String>>,
    piece_size: usize,
}

impl MockClient {
    pub fn new() -> Self {
        Self {
            piece_size: 8 * 1024,
            ..Self::default()
        }
    }

    /// Size of the pieces a streamed body is split into.
    pub fn piece_size(mut self, piece_size: usize) -> Self {
        self.piece_size = piece_size.max(1);
        self
    }

    pub fn insert(&self, url: impl Into<String>, body: impl Into<Bytes>) {
        self.lock_objects().insert(url.into(), Object::Body(body.into()));
    }

    /// Make `url` answer with a non-success status.
    pub fn fail_with_status(&self, url: impl Into<String>, status: u16) {
        self.lock_objects().insert(url.into(), Object::Status(status));
    }

    /// Make `url` answer 200, stream `body` and then drop the connection.
    pub fn fail_after(&self, url: impl Into<String>, body: impl Into<Bytes>) {
        self.lock_objects().insert(url.into(), Object::Truncated(body.into()));
    }

    /// Make `url` fail as if the connection could not be established.
    pub fn fail_connection(&self, url: impl Into<String>) {
        self.lock_objects().insert(url.into(), Object::Unreachable);
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn request_count(&self) -> usize { self.requests().len() }

    pub fn clear_requests(&self) {
        if let Ok(mut requests) = self.requests.lock() {
            requests.clear();
        }
    }

    fn lock_objects(&self) -> std::sync::MutexGuard<'_, HashMap<String, Object>> {
        self.objects.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lookup(&self, url: &str) -> Result<Object> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(url.to_string());
        }
        match self.lock_objects().get(url).cloned() {
            Some(object @ (Object::Body(_) | Object::Truncated(_))) => Ok(object),
            Some(Object::Status(status)) => Err(TransportError::Status {
                url: url.to_string(),
                status,
            }),
            Some(Object::Unreachable) => Err(TransportError::Connection {
                url:     url.to_string(),
                message: "connection refused".to_string(),
            }),
            None => Err(TransportError::Status {
                url:    url.to_string(),
                status: 404,
            }),
        }
    }
}

fn reset(url: &str) -> TransportError {
    TransportError::Body {
        url:     url.to_string(),
        message: "connection reset".to_string(),
    }
}

impl HttpClient for MockClient {
    async fn get_text(&self, url: &str) -> Result<String> {
        let body = match self.lookup(url)? {
            Object::Body(body) => body,
            _ => return Err(reset(url)),
        };
        String::from_utf8(body.to_vec()).map_err(|_| TransportError::InvalidText {
            url: url.to_string(),
        })
    }

    async fn stream(&self, url: &str) -> Result<ByteStream> {
        let (body, truncated) = match self.lookup(url)? {
            Object::Truncated(body) => (body, true),
            Object::Body(body) => (body, false),
            _ => return Err(reset(url)),
        };
        let mut pieces: Vec<Result<Bytes>> = body
            .chunks(self.piece_size.max(1))
            .map(|piece| Ok(Bytes::copy_from_slice(piece)))
            .collect();
        if truncated {
            pieces.push(Err(reset(url)));
        }
        Ok(Box::pin(futures_util::stream::iter(pieces)))
    }
}

#[cfg(test)]
mod tests {
    use futures_util::{StreamExt, TryStreamExt};

    use super::*;

    #[tokio::test]
    async fn test_stream_yields_pieces_and_records_requests() {
        let client = MockClient::new().piece_size(3);
        client.insert("http://h/a", &b"abcdefgh"[..]);

        let pieces: Vec<Bytes> = client.stream("http://h/a").await.unwrap().try_collect().await.unwrap();
        assert_eq!(pieces.len(), 3);
        assert_eq!(pieces.concat(), b"abcdefgh");
        assert_eq!(client.requests(), vec!["http://h/a".to_string()]);
    }

    #[tokio::test]
    async fn test_unknown_url_is_404() {
        let client = MockClient::new();
        let err = client.get_text("http://h/missing").await.unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test]
    async fn test_truncated_body_fails_after_its_pieces() {
        let client = MockClient::new().piece_size(4);
        client.fail_after("http://h/t", &b"abcdefgh"[..]);

        let results: Vec<Result<Bytes>> = client.stream("http://h/t").await.unwrap().collect().await;
        assert_eq!(results.len(), 3);
        assert_eq!(&results[0].as_ref().unwrap()[..], b"abcd");
        assert_eq!(&results[1].as_ref().unwrap()[..], b"efgh");
        assert!(matches!(results[2], Err(TransportError::Body { .. })));

        assert!(matches!(client.get_text("http://h/t").await, Err(TransportError::Body { .. })));
    }

    #[tokio::test]
    async fn test_connection_failure_has_no_status() {
        let client = MockClient::new();
        client.fail_connection("http://h/x");
        let err = client.stream("http://h/x").await.err().unwrap();
        assert_eq!(err.status(), None);
        assert_eq!(err.url(), "http://h/x");
    }
}
