//! Core logic of a streaming chat client: the session state machine,
//! incremental decoding of replies, and the host that drives a session
//! from presentation events.

#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc)]

#[macro_use]
extern crate tracing;

pub mod decoder;
mod endpoint_client;
mod error;
mod host;
mod session;
pub mod transcript;

pub use decoder::{DecodeError, DecodeMode, Utf8Decoder};
pub use endpoint_client::{EndpointClient, ResponseStream};
pub use error::{ExchangeError, ExchangeErrorKind, HostClosedError, SubmitError};
pub use host::{BusyPolicy, SessionHost, SessionHostBuilder};
pub use session::{ChatSession, ExchangePhase, SubmitOutcome};
pub use transcript::{Speaker, Transcript, Turn};
