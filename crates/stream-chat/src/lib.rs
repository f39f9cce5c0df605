//! A terminal chat client that prints replies while they stream in.
//!
//! The crate includes a CLI tool for using in the terminal. The pieces it
//! is made of can also be used as a library to drive a chat session from
//! your own presentation layer.

#![deny(missing_docs)]

mod input;
mod progress;
mod render;
mod settings;

pub use input::LineReader;
pub use progress::ReplyProgress;
pub use render::TranscriptPrinter;
pub use settings::Settings;

/// Re-exports of [`stream_chat_core`] crate.
pub mod core {
    pub use stream_chat_core::*;
}

/// Re-exports of [`stream_chat_http`] crate.
pub mod http {
    pub use stream_chat_http::*;
}
