//! A local fake chat endpoint for testing purpose.

mod preset;

use std::collections::VecDeque;
use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll, ready};
use std::time::Duration;

use bytes::Bytes;
use stream_chat_endpoint::{
    ChatEndpoint, ChatRequest, ChatResponse, EndpointError, ErrorKind,
};
use tokio::time::{Sleep, sleep};

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for Error {}

impl EndpointError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

pub struct TestChatResponse {
    chunks: VecDeque<PresetChunk>,
    delay: Duration,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl ChatResponse for TestChatResponse {
    type Error = crate::Error;

    fn poll_next_chunk(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<Bytes>, Self::Error>> {
        let this = self.get_mut();
        if let Some(sleep) = &mut this.sleep {
            ready!(sleep.as_mut().poll(cx));
            this.sleep = None;

            let chunk = match this.chunks.pop_front() {
                Some(PresetChunk::Text(text)) => Bytes::from(text),
                Some(PresetChunk::Bytes(bytes)) => Bytes::from(bytes),
                Some(PresetChunk::Interrupt) => {
                    // Nothing can be read after the body breaks off.
                    this.chunks.clear();
                    return Poll::Ready(Err(Error::new(
                        "connection closed before the body ended",
                        ErrorKind::StreamInterrupted,
                    )));
                }
                None => return Poll::Ready(Ok(None)),
            };
            return Poll::Ready(Ok(Some(chunk)));
        }
        this.sleep = Some(Box::pin(sleep(this.delay)));
        Pin::new(this).poll_next_chunk(cx)
    }
}

#[derive(Default)]
struct Shared {
    script: Mutex<VecDeque<PresetResponse>>,
    requests: Mutex<Vec<ChatRequest>>,
}

/// A local fake chat endpoint for testing purpose.
///
/// Before sending requests, you need to setup the script, which is how the
/// endpoint should respond to each request. Responses are consumed in the
/// order they were added, one per request. If the script runs out, an error
/// will be returned.
///
/// Clones share the same script and request log, so a clone kept by the test
/// can inspect what the code under test has sent.
#[derive(Clone, Default)]
pub struct TestEndpoint {
    shared: Arc<Shared>,
    delay: Option<Duration>,
}

impl TestEndpoint {
    /// Appends a response to the script.
    #[inline]
    pub fn add_response(&self, preset: PresetResponse) {
        lock(&self.shared.script).push_back(preset);
    }

    /// Sets the delay before each chunk is produced.
    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Returns the requests received so far.
    #[inline]
    pub fn requests(&self) -> Vec<ChatRequest> {
        lock(&self.shared.requests).clone()
    }

    /// Returns the number of requests received so far.
    #[inline]
    pub fn request_count(&self) -> usize {
        lock(&self.shared.requests).len()
    }
}

impl Debug for TestEndpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestEndpoint")
            .field("pending_responses", &lock(&self.shared.script).len())
            .field("requests", &self.request_count())
            .finish()
    }
}

impl ChatEndpoint for TestEndpoint {
    type Error = crate::Error;
    type Response = TestChatResponse;

    fn send_request(
        &self,
        req: &ChatRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        lock(&self.shared.requests).push(req.clone());

        let result = match lock(&self.shared.script).pop_front() {
            None => {
                Err(Error::new("no preset response left", ErrorKind::Other))
            }
            Some(PresetResponse {
                rejection: Some(PresetRejection::NetworkUnavailable),
                ..
            }) => Err(Error::new(
                "connection refused",
                ErrorKind::NetworkUnavailable,
            )),
            Some(PresetResponse {
                rejection: Some(PresetRejection::Status(status)),
                ..
            }) => Err(Error::new(
                format!("server answered with status {status}"),
                ErrorKind::NonSuccessStatus,
            )),
            Some(PresetResponse { chunks, .. }) => Ok(TestChatResponse {
                chunks: chunks.into(),
                delay: self.delay.unwrap_or(Duration::from_millis(1)),
                sleep: None,
            }),
        };
        ready(result)
    }
}

#[inline]
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
