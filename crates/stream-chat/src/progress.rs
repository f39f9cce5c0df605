use stream_chat_core::ExchangePhase;

/// Tells whether a submitted message is still waiting for its reply to
/// start, from the phases of the session updates that follow it.
///
/// The draft is set before it is submitted, so an update in the idle phase
/// may come before the exchange opens. Only an idle phase after the
/// exchange has been seen ends the wait.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReplyProgress {
    exchange_opened: bool,
    reply_started: bool,
}

impl ReplyProgress {
    /// Creates a tracker for a message that has just been submitted.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds the phase of the next update and returns whether the reply is
    /// still awaited.
    pub fn observe(&mut self, phase: ExchangePhase) -> bool {
        match phase {
            ExchangePhase::AwaitingFirstChunk => self.exchange_opened = true,
            ExchangePhase::StreamingAppend => self.reply_started = true,
            // Failed, or the reply was empty.
            ExchangePhase::Idle if self.exchange_opened => {
                self.reply_started = true
            }
            ExchangePhase::Idle => {}
        }
        self.is_waiting()
    }

    /// Returns `true` until the reply has started or the exchange has ended.
    #[inline]
    pub fn is_waiting(&self) -> bool {
        !self.reply_started
    }
}
