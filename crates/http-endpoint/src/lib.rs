//! A chat endpoint over plain HTTP.
//!
//! Requests are posted as JSON (`{"message": "..."}`), and the response
//! body is streamed back chunk by chunk as it arrives from the server.

#[macro_use]
extern crate tracing;

mod config;
mod io;
mod proto;
mod response;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use mime::Mime;
use reqwest::{Client, Response, header};
use stream_chat_endpoint::{
    ChatEndpoint, ChatRequest, EndpointError, ErrorKind,
};

pub use config::{HttpEndpointConfig, HttpEndpointConfigBuilder};
use io::Chunks;
pub use response::HttpChatResponse;

/// Error type for [`HttpEndpoint`].
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

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for Error {}

impl EndpointError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// Chat endpoint that posts to an HTTP server.
#[derive(Clone, Debug)]
pub struct HttpEndpoint {
    client: Client,
    config: Arc<HttpEndpointConfig>,
}

impl HttpEndpoint {
    /// Creates a new `HttpEndpoint` with the given configuration.
    #[inline]
    pub fn new(config: HttpEndpointConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }

    /// Returns the configuration of this endpoint.
    #[inline]
    pub fn config(&self) -> &HttpEndpointConfig {
        &self.config
    }
}

impl Default for HttpEndpoint {
    #[inline]
    fn default() -> Self {
        Self::new(HttpEndpointConfig::default())
    }
}

impl ChatEndpoint for HttpEndpoint {
    type Error = Error;
    type Response = HttpChatResponse;

    fn send_request(
        &self,
        req: &ChatRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let url = self.config.url();
        debug!("posting a message to {url}");
        let resp_fut = self
            .client
            .post(url)
            .header(header::CONTENT_TYPE, "application/json")
            .json(&proto::create_request_body(req))
            .send();

        async move {
            let resp = match resp_fut.await.and_then(Response::error_for_status)
            {
                Ok(resp) => resp,
                Err(err) => {
                    return Err(Error::new(format!("{err}"), classify(&err)));
                }
            };

            // The body is read as UTF-8 no matter what the server says,
            // unless it explicitly declares another charset.
            let content_type = resp
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok());
            let charset = content_type
                .and_then(|v| v.parse::<Mime>().ok())
                .and_then(|m| {
                    m.get_param(mime::CHARSET).map(|c| c.as_str().to_owned())
                });
            if let Some(charset) = charset.filter(|c| !is_utf8_charset(c)) {
                return Err(Error::new(
                    format!("Unsupported charset: {charset}"),
                    ErrorKind::Other,
                ));
            }

            // Here we got a successful response.
            trace!("response started with status {}", resp.status());
            Ok(HttpChatResponse::from_chunks(Chunks::from_response(resp)))
        }
    }
}

fn classify(err: &reqwest::Error) -> ErrorKind {
    if err.is_status() {
        ErrorKind::NonSuccessStatus
    } else if err.is_connect() || err.is_timeout() {
        ErrorKind::NetworkUnavailable
    } else if err.is_body() || err.is_decode() {
        ErrorKind::StreamInterrupted
    } else {
        ErrorKind::Other
    }
}

#[inline]
fn is_utf8_charset(charset: &str) -> bool {
    charset.eq_ignore_ascii_case("utf-8") || charset.eq_ignore_ascii_case("utf8")
}
