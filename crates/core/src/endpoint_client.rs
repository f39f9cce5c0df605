use std::future::poll_fn;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::Bytes;
use stream_chat_endpoint::{
    ChatEndpoint, ChatRequest, ChatResponse, EndpointError,
};
use tracing::Instrument;

type SendRequestResult = Result<ResponseStream, Box<dyn EndpointError>>;
type BoxedSendRequestFuture =
    Pin<Box<dyn Future<Output = SendRequestResult> + Send>>;
type HandlerFn =
    Arc<dyn Fn(ChatRequest) -> BoxedSendRequestFuture + Send + Sync>;

/// A wrapper around a chat endpoint that provides a type-erased interface
/// for the other modules.
#[derive(Clone)]
pub struct EndpointClient {
    handler_fn: HandlerFn,
}

impl EndpointClient {
    /// Creates a client that sends requests to `endpoint`.
    pub fn new<E: ChatEndpoint + 'static>(endpoint: E) -> Self {
        // We have to erase the type `E`, since `EndpointClient` doesn't have
        // a generic parameter and we don't want it either.
        let handler_fn: HandlerFn =
            Arc::new(move |req| -> BoxedSendRequestFuture {
                let fut = endpoint.send_request(&req);
                Box::pin(
                    async move {
                        trace!("sent a request: {req:?}");
                        match fut.await {
                            Ok(resp) => Ok(ResponseStream::new(resp)),
                            Err(err) => {
                                error!("request failed: {err}");
                                Err(Box::new(err) as Box<dyn EndpointError>)
                            }
                        }
                    }
                    .instrument(trace_span!("endpoint client req")),
                )
            });
        Self { handler_fn }
    }

    /// Sends a request and waits for the response to start.
    #[inline]
    pub async fn send(&self, req: ChatRequest) -> SendRequestResult {
        (self.handler_fn)(req).await
    }
}

trait AnyResponse: Send {
    fn poll_chunk(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<Bytes>, Box<dyn EndpointError>>>;
}

impl<R: ChatResponse> AnyResponse for R {
    #[inline]
    fn poll_chunk(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<Bytes>, Box<dyn EndpointError>>> {
        self.poll_next_chunk(cx)
            .map_err(|err| Box::new(err) as Box<dyn EndpointError>)
    }
}

/// The body of a started response.
pub struct ResponseStream {
    inner: Pin<Box<dyn AnyResponse>>,
    received: usize,
}

impl ResponseStream {
    #[inline]
    fn new<R: ChatResponse>(resp: R) -> Self {
        Self {
            inner: Box::pin(resp),
            received: 0,
        }
    }

    /// Reads the next chunk of the body, `None` once it has ended.
    ///
    /// # Cancel safety
    ///
    /// This method is cancel safe as long as the underlying response is.
    pub async fn next_chunk(
        &mut self,
    ) -> Result<Option<Bytes>, Box<dyn EndpointError>> {
        let chunk = poll_fn(|cx| self.inner.as_mut().poll_chunk(cx)).await?;
        match &chunk {
            Some(chunk) => {
                self.received += chunk.len();
                trace!("got a chunk of {} bytes", chunk.len());
            }
            None => trace!("body ended after {} bytes", self.received),
        }
        Ok(chunk)
    }

    /// Returns the number of body bytes read so far.
    #[inline]
    pub fn received_bytes(&self) -> usize {
        self.received
    }
}
