//! The contract between a chat client and the remote chat API.
//!
//! A chat endpoint accepts one user message and answers with an open-ended
//! stream of bytes. The stream has no message framing, consumers treat the
//! whole body as one continuous text and decode it incrementally.
//!
//! Types in this crate don't define any behavior, they are the constraints
//! that endpoint implementors should adhere to. Decoding and transcript
//! bookkeeping belong to the consumer.

#![deny(missing_docs)]

mod endpoint;
mod error;
mod request;
mod response;

pub use endpoint::*;
pub use error::*;
pub use request::*;
pub use response::*;
