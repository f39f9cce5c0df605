use std::pin::Pin;
use std::task::{Context, Poll, ready};

use bytes::Bytes;
use pin_project_lite::pin_project;
use stream_chat_endpoint::ChatResponse;

use crate::Error;
use crate::io::Chunks;

type PinnedFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
type NextChunk = Result<(Option<Bytes>, Chunks), Error>;

pin_project! {
    /// A streamed response body from [`crate::HttpEndpoint`].
    pub struct HttpChatResponse {
        next_chunk_fut: Option<PinnedFuture<NextChunk>>,
        received: usize,
    }
}

impl HttpChatResponse {
    #[inline]
    pub(crate) fn from_chunks(chunks: Chunks) -> Self {
        Self {
            next_chunk_fut: Some(Box::pin(next_chunk(chunks))),
            received: 0,
        }
    }

    /// Returns the number of body bytes received so far.
    #[inline]
    pub fn received_bytes(&self) -> usize {
        self.received
    }
}

impl ChatResponse for HttpChatResponse {
    type Error = crate::Error;

    fn poll_next_chunk(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<Bytes>, Self::Error>> {
        let this = self.project();
        let Some(next_chunk_fut) = this.next_chunk_fut else {
            return Poll::Ready(Ok(None));
        };
        let (chunk, chunks) = match ready!(next_chunk_fut.as_mut().poll(cx)) {
            Ok((Some(chunk), chunks)) => (chunk, chunks),
            Ok((None, _)) => {
                trace!("body ended after {} bytes", this.received);
                *this.next_chunk_fut = None;
                return Poll::Ready(Ok(None));
            }
            Err(err) => {
                *this.next_chunk_fut = None;
                return Poll::Ready(Err(err));
            }
        };

        // The body may still have more data to pull, create a new future
        // for the next chunk.
        *this.received += chunk.len();
        *this.next_chunk_fut = Some(Box::pin(next_chunk(chunks)));

        Poll::Ready(Ok(Some(chunk)))
    }
}

async fn next_chunk(mut chunks: Chunks) -> NextChunk {
    loop {
        match chunks.next_chunk().await? {
            // Empty chunks carry nothing to decode.
            Some(chunk) if chunk.is_empty() => continue,
            Some(chunk) => {
                trace!("got a chunk of {} bytes", chunk.len());
                return Ok((Some(chunk), chunks));
            }
            None => return Ok((None, chunks)),
        }
    }
}
