/// A request to be sent to a chat endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ChatRequest {
    /// The user message, already trimmed.
    pub message: String,
}

impl ChatRequest {
    /// Creates a request carrying `message`.
    #[inline]
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
        }
    }
}
