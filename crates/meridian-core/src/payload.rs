//! Request body stream.
//!
//! The transport hands the dispatcher a body stream that can be consumed
//! once. [`Payload`] wraps it in a cloneable handle whose first
//! [`read`](Payload::read) drains the stream and caches the bytes, so later
//! readers (and clones of the context) see the same data.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use http_body::Body;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty};
use thiserror::Error;
use tokio::sync::Mutex;

/// Boxed error produced by an erased body stream.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error reading the request body stream.
#[derive(Debug, Clone, Error)]
#[error("failed to read request body: {message}")]
pub struct PayloadError {
    message: String,
}

impl PayloadError {
    /// Returns the transport's error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

enum PayloadState {
    Pending(UnsyncBoxBody<Bytes, BoxError>),
    Buffered(Bytes),
    Failed(PayloadError),
}

/// Cloneable handle to a request body that is read at most once.
#[derive(Clone)]
pub struct Payload {
    state: Arc<Mutex<PayloadState>>,
}

impl Payload {
    /// Wraps a body stream.
    pub fn from_body<B>(body: B) -> Self
    where
        B: Body<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        Self::with_state(PayloadState::Pending(
            body.map_err(Into::into).boxed_unsync(),
        ))
    }

    /// Creates a payload that is already buffered.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self::with_state(PayloadState::Buffered(bytes.into()))
    }

    /// Creates a payload with no content.
    pub fn empty() -> Self {
        Self::from_body(Empty::<Bytes>::new())
    }

    fn with_state(state: PayloadState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Reads the full body.
    ///
    /// The first call drains the stream; subsequent calls return the cached
    /// bytes or the cached error.
    pub async fn read(&self) -> Result<Bytes, PayloadError> {
        let mut state = self.state.lock().await;

        if let PayloadState::Pending(_) = &*state {
            let pending = std::mem::replace(&mut *state, PayloadState::Buffered(Bytes::new()));
            if let PayloadState::Pending(body) = pending {
                *state = match body.collect().await {
                    Ok(collected) => PayloadState::Buffered(collected.to_bytes()),
                    Err(err) => PayloadState::Failed(PayloadError {
                        message: err.to_string(),
                    }),
                };
            }
        }

        match &*state {
            PayloadState::Buffered(bytes) => Ok(bytes.clone()),
            PayloadState::Failed(err) => Err(err.clone()),
            PayloadState::Pending(_) => Ok(Bytes::new()),
        }
    }
}

impl Default for Payload {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.state.try_lock() {
            Ok(guard) => match &*guard {
                PayloadState::Pending(_) => "pending",
                PayloadState::Buffered(_) => "buffered",
                PayloadState::Failed(_) => "failed",
            },
            Err(_) => "reading",
        };
        f.debug_struct("Payload").field("state", &state).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body::Frame;
    use http_body_util::{Full, StreamBody};

    #[tokio::test]
    async fn test_read_full_body() {
        let payload = Payload::from_body(Full::new(Bytes::from_static(b"{\"a\":1}")));
        assert_eq!(payload.read().await.unwrap(), Bytes::from_static(b"{\"a\":1}"));
    }

    #[tokio::test]
    async fn test_read_twice_returns_cached_bytes() {
        let payload = Payload::from_body(Full::new(Bytes::from_static(b"hello")));
        let clone = payload.clone();

        assert_eq!(payload.read().await.unwrap(), "hello");
        assert_eq!(clone.read().await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_empty_payload() {
        assert!(Payload::empty().read().await.unwrap().is_empty());
        assert!(Payload::default().read().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stream_error_is_cached() {
        let chunks: Vec<Result<Frame<Bytes>, std::io::Error>> = vec![
            Ok(Frame::data(Bytes::from_static(b"par"))),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
        ];
        let body = StreamBody::new(futures_util::stream::iter(chunks));
        let payload = Payload::from_body(body);

        let err = payload.read().await.unwrap_err();
        assert!(err.message().contains("reset"));
        assert!(payload.read().await.is_err());
    }

    #[tokio::test]
    async fn test_from_bytes() {
        let payload = Payload::from_bytes("buffered");
        assert_eq!(payload.read().await.unwrap(), "buffered");
        assert!(format!("{payload:?}").contains("buffered"));
    }
}
