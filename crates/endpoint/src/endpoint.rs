use std::error::Error;

use crate::error::ErrorKind;
use crate::request::ChatRequest;
use crate::response::ChatResponse;

/// The error type for a chat endpoint.
pub trait EndpointError: Error + Send + Sync + 'static {
    /// Returns the kind of this error.
    fn kind(&self) -> ErrorKind;
}

/// A remote chat API that answers a message with a streamed body.
///
/// Once the endpoint is created, it should behave like a stateless object.
/// It can still have internal state (a connection pool, for example), but
/// callers should not rely on it, and the endpoint should be prepared for
/// being dropped anytime.
pub trait ChatEndpoint: Send + Sync {
    /// The error type that may be returned by the endpoint.
    type Error: EndpointError;

    /// The streamed response type for this endpoint.
    type Response: ChatResponse<Error = Self::Error>;

    /// Sends a request to the endpoint.
    ///
    /// The returned future resolves once the response has started, that is
    /// when its body can be read. Errors that happen before that point, like
    /// an unreachable host or a non-success status, are returned here.
    fn send_request(
        &self,
        req: &ChatRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static;
}
