#[cfg(test)]
mod tests;

use stream_chat_endpoint::ChatRequest;
use tracing::Instrument;

use crate::decoder::{DecodeMode, Utf8Decoder};
use crate::endpoint_client::EndpointClient;
use crate::error::{ExchangeError, SubmitError};
use crate::transcript::{Transcript, Turn};

/// Where the session is within the current exchange.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ExchangePhase {
    /// No exchange is open.
    #[default]
    Idle,
    /// The user turn is in, no text has been decoded from the reply yet.
    AwaitingFirstChunk,
    /// The bot turn exists and grows with every decoded fragment.
    StreamingAppend,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum Exchange {
    #[default]
    Idle,
    AwaitingFirstChunk,
    StreamingAppend {
        bot_turn: usize,
    },
}

/// How a call to [`ChatSession::submit`] ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The input was empty once trimmed, nothing happened.
    Ignored,
    /// The reply has been streamed completely.
    Completed,
    /// The exchange failed, and a failure turn has been appended.
    Failed(ExchangeError),
}

/// A chat session: the draft being typed and the transcript so far.
///
/// Only one exchange can be open at a time. While it is open, the bot turn
/// receiving text is tracked by its index, and it is never looked up from
/// the tail of the transcript.
#[derive(Clone, Debug, Default)]
pub struct ChatSession {
    pending_input: String,
    transcript: Transcript,
    exchange: Exchange,
    decoder: Utf8Decoder,
}

impl ChatSession {
    /// Creates an empty session that decodes replies leniently.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty session with the given decode mode.
    #[inline]
    pub fn with_decode_mode(mode: DecodeMode) -> Self {
        Self {
            decoder: Utf8Decoder::new(mode),
            ..Default::default()
        }
    }

    /// Returns the draft that has not been submitted yet.
    #[inline]
    pub fn pending_input(&self) -> &str {
        &self.pending_input
    }

    /// Replaces the draft, as when the user edits the input box.
    #[inline]
    pub fn set_pending_input<S: Into<String>>(&mut self, input: S) {
        self.pending_input = input.into();
    }

    /// Returns the transcript so far.
    #[inline]
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Returns how reply bodies are decoded.
    #[inline]
    pub fn decode_mode(&self) -> DecodeMode {
        self.decoder.mode()
    }

    /// Returns the phase of the current exchange.
    pub fn phase(&self) -> ExchangePhase {
        match self.exchange {
            Exchange::Idle => ExchangePhase::Idle,
            Exchange::AwaitingFirstChunk => ExchangePhase::AwaitingFirstChunk,
            Exchange::StreamingAppend { .. } => ExchangePhase::StreamingAppend,
        }
    }

    /// Returns `true` while a reply is expected or streaming.
    #[inline]
    pub fn is_exchange_open(&self) -> bool {
        self.exchange != Exchange::Idle
    }

    /// Returns the index of the bot turn that is still receiving text.
    #[inline]
    pub fn open_bot_turn(&self) -> Option<usize> {
        match self.exchange {
            Exchange::StreamingAppend { bot_turn } => Some(bot_turn),
            _ => None,
        }
    }

    /// Takes the trimmed draft out of the input box.
    ///
    /// Returns `None` and leaves the draft untouched if there is nothing
    /// but whitespace in it.
    pub fn take_submission(&mut self) -> Option<String> {
        let trimmed = self.pending_input.trim();
        if trimmed.is_empty() {
            return None;
        }
        let text = trimmed.to_owned();
        self.pending_input.clear();
        Some(text)
    }

    /// Opens an exchange for the current draft.
    ///
    /// Returns `Ok(None)` without touching anything if the draft is empty
    /// once trimmed.
    pub fn begin_exchange(
        &mut self,
    ) -> Result<Option<ChatRequest>, SubmitError> {
        if self.is_exchange_open() {
            return Err(SubmitError::ExchangeInProgress);
        }
        let Some(text) = self.take_submission() else {
            return Ok(None);
        };
        self.begin_exchange_with(text).map(Some)
    }

    /// Opens an exchange for `text`, which doesn't go through the draft.
    pub fn begin_exchange_with(
        &mut self,
        text: String,
    ) -> Result<ChatRequest, SubmitError> {
        if self.is_exchange_open() {
            return Err(SubmitError::ExchangeInProgress);
        }
        let text = text.trim().to_owned();
        if text.is_empty() {
            return Err(SubmitError::EmptyInput);
        }

        self.transcript.push(Turn::user(text.clone()));
        self.decoder.reset();
        self.exchange = Exchange::AwaitingFirstChunk;
        debug!("exchange opened at turn {}", self.transcript.len() - 1);

        Ok(ChatRequest::new(text))
    }

    /// Feeds the next chunk of the reply body.
    ///
    /// Returns `Ok(true)` if the transcript has changed. A decode error fails
    /// the exchange before it is returned.
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Result<bool, ExchangeError> {
        if !self.is_exchange_open() {
            warn!("dropping a chunk received outside of an exchange");
            return Ok(false);
        }
        let fragment = match self.decoder.decode(chunk) {
            Ok(fragment) => fragment,
            Err(err) => {
                // Text before the bad bytes is kept, as if it had come in a
                // chunk of its own.
                if !err.valid_prefix().is_empty() {
                    self.append_fragment(err.valid_prefix());
                }
                let err = ExchangeError::from(err);
                self.fail_exchange(&err);
                return Err(err);
            }
        };
        if fragment.is_empty() {
            return Ok(false);
        }
        self.append_fragment(&fragment);
        Ok(true)
    }

    /// Ends the exchange after the body has ended.
    ///
    /// Bytes the decoder still holds back are flushed first, which fails the
    /// exchange in strict mode.
    pub fn finish_exchange(&mut self) -> Result<(), ExchangeError> {
        if !self.is_exchange_open() {
            return Ok(());
        }
        let tail = match self.decoder.finish() {
            Ok(tail) => tail,
            Err(err) => {
                let err = ExchangeError::from(err);
                self.fail_exchange(&err);
                return Err(err);
            }
        };
        if !tail.is_empty() {
            self.append_fragment(&tail);
        }

        if self.exchange == Exchange::AwaitingFirstChunk {
            debug!("exchange closed with an empty reply");
        }
        self.exchange = Exchange::Idle;
        Ok(())
    }

    /// Ends the exchange with an error.
    ///
    /// A bot turn that has already received text keeps it, and a failure
    /// turn is appended after it.
    pub fn fail_exchange(&mut self, err: &ExchangeError) {
        if !self.is_exchange_open() {
            warn!("ignoring a failure outside of an exchange: {err}");
            return;
        }
        warn!("exchange failed: {err}");
        self.decoder.reset();
        self.exchange = Exchange::Idle;
        self.transcript.push(Turn::failure(err.kind(), err.message()));
    }

    fn append_fragment(&mut self, fragment: &str) {
        match self.exchange {
            Exchange::StreamingAppend { bot_turn } => {
                self.transcript.append_text(bot_turn, fragment);
            }
            Exchange::AwaitingFirstChunk => {
                let bot_turn = self.transcript.push(Turn::bot(fragment));
                self.exchange = Exchange::StreamingAppend { bot_turn };
            }
            Exchange::Idle => {}
        }
    }

    /// Submits the draft and streams the reply into the transcript.
    ///
    /// `on_update` is called after every change to the session, the first
    /// time right after the user turn is appended and before the request is
    /// sent. Failures of the exchange are recorded in the transcript and
    /// reported as [`SubmitOutcome::Failed`].
    pub async fn submit(
        &mut self,
        client: &EndpointClient,
        mut on_update: impl FnMut(&ChatSession),
    ) -> Result<SubmitOutcome, SubmitError> {
        let Some(request) = self.begin_exchange()? else {
            trace!("ignoring an empty submit");
            return Ok(SubmitOutcome::Ignored);
        };
        on_update(self);

        let span = trace_span!("exchange", turn = self.transcript.len() - 1);
        let outcome = self
            .stream_reply(client, request, &mut on_update)
            .instrument(span)
            .await;
        on_update(self);
        Ok(outcome)
    }

    async fn stream_reply(
        &mut self,
        client: &EndpointClient,
        request: ChatRequest,
        on_update: &mut impl FnMut(&ChatSession),
    ) -> SubmitOutcome {
        let mut stream = match client.send(request).await {
            Ok(stream) => stream,
            Err(err) => {
                let err = ExchangeError::from_endpoint(&*err);
                self.fail_exchange(&err);
                return SubmitOutcome::Failed(err);
            }
        };

        loop {
            let chunk = match stream.next_chunk().await {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(err) => {
                    let err = ExchangeError::from_endpoint(&*err);
                    self.fail_exchange(&err);
                    return SubmitOutcome::Failed(err);
                }
            };
            match self.push_chunk(&chunk) {
                Ok(true) => on_update(self),
                Ok(false) => {}
                Err(err) => return SubmitOutcome::Failed(err),
            }
        }

        match self.finish_exchange() {
            Ok(()) => SubmitOutcome::Completed,
            Err(err) => SubmitOutcome::Failed(err),
        }
    }
}
