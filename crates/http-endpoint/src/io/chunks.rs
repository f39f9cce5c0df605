#[cfg(test)]
use std::collections::VecDeque;

use bytes::Bytes;
use reqwest::Response;
use stream_chat_endpoint::ErrorKind;

use crate::Error;

/// An adapter for streaming byte chunks.
pub enum Chunks {
    Response(Response),
    #[cfg(test)]
    VecDeque(VecDeque<Result<Bytes, Error>>),
}

impl Chunks {
    pub fn from_response(response: Response) -> Self {
        Chunks::Response(response)
    }

    #[cfg(test)]
    pub fn from_vec_deque(vec: VecDeque<Result<Bytes, Error>>) -> Self {
        Chunks::VecDeque(vec)
    }

    #[inline]
    pub async fn next_chunk(&mut self) -> Result<Option<Bytes>, Error> {
        match self {
            Chunks::Response(response) => {
                response.chunk().await.map_err(|err| {
                    let kind = match crate::classify(&err) {
                        // Anything going wrong after the head has arrived
                        // breaks the body.
                        ErrorKind::Other => ErrorKind::StreamInterrupted,
                        kind => kind,
                    };
                    Error::new(format!("{err}"), kind)
                })
            }
            #[cfg(test)]
            Chunks::VecDeque(vec) => vec.pop_front().transpose(),
        }
    }
}
