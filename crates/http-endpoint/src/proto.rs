use serde::Serialize;
use stream_chat_endpoint::ChatRequest;

/// The JSON body posted to the chat API.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ChatRequestBody<'a> {
    message: &'a str,
}

#[inline]
pub fn create_request_body(req: &ChatRequest) -> ChatRequestBody<'_> {
    ChatRequestBody {
        message: &req.message,
    }
}
