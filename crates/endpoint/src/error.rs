/// The kind of error that occurred while talking to an endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The endpoint could not be reached.
    NetworkUnavailable,
    /// The endpoint answered with a non-success status.
    NonSuccessStatus,
    /// The response body broke off before it was complete.
    StreamInterrupted,
    /// Any other errors.
    Other,
}
