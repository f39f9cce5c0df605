use std::error::Error;
use std::fmt::{self, Display};

use stream_chat_endpoint::{EndpointError, ErrorKind};

use crate::decoder::DecodeError;

/// The reason an exchange failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExchangeErrorKind {
    /// The endpoint could not be reached.
    NetworkUnavailable,
    /// The endpoint answered with a non-success status.
    NonSuccessStatus,
    /// The response body broke off.
    StreamInterrupted,
    /// The response body was not valid UTF-8.
    DecodeError,
    /// Any other errors.
    Other,
}

impl From<ErrorKind> for ExchangeErrorKind {
    #[inline]
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::NetworkUnavailable => Self::NetworkUnavailable,
            ErrorKind::NonSuccessStatus => Self::NonSuccessStatus,
            ErrorKind::StreamInterrupted => Self::StreamInterrupted,
            ErrorKind::Other => Self::Other,
        }
    }
}

/// An error that ended an exchange.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ExchangeError {
    message: String,
    kind: ExchangeErrorKind,
}

impl ExchangeError {
    /// Creates an error with the given message and kind.
    #[inline]
    pub fn new(message: impl Into<String>, kind: ExchangeErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    /// Returns the kind of this error.
    #[inline]
    pub fn kind(&self) -> ExchangeErrorKind {
        self.kind
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    pub(crate) fn from_endpoint(err: &dyn EndpointError) -> Self {
        Self::new(err.to_string(), err.kind().into())
    }
}

impl Display for ExchangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for ExchangeError {}

impl From<DecodeError> for ExchangeError {
    #[inline]
    fn from(err: DecodeError) -> Self {
        Self::new(err.to_string(), ExchangeErrorKind::DecodeError)
    }
}

/// The reason a submit was refused before anything happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SubmitError {
    /// The previous exchange is still streaming.
    ExchangeInProgress,
    /// The message is empty once trimmed.
    EmptyInput,
}

impl Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExchangeInProgress => "an exchange is still in progress",
            Self::EmptyInput => "the message is empty",
        }
        .fmt(f)
    }
}

impl Error for SubmitError {}

/// A type of error which can be returned whenever events are sent to a
/// [`crate::SessionHost`] that has stopped.
pub struct HostClosedError;

impl fmt::Debug for HostClosedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostClosedError").finish()
    }
}

impl Display for HostClosedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        "the session host has stopped".fmt(f)
    }
}

impl Error for HostClosedError {}
