mod builder;
mod state;

use tokio::sync::mpsc;

use crate::error::HostClosedError;
pub use builder::SessionHostBuilder;
use state::HostEvent;

/// What [`SessionHost`] does with a submit that arrives while an exchange is
/// still streaming.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BusyPolicy {
    /// Drop the submit and keep the draft where it is.
    #[default]
    Reject,
    /// Take the draft now and start its exchange once the open one ends.
    Queue,
}

/// Owns a [`crate::ChatSession`] on a background task and drives it from
/// presentation events.
///
/// Events are handled in the order they are sent, no matter which stage the
/// session is in. For example, an "input changed" event is applied at once
/// even while a reply is streaming. Observers learn about changes through the
/// callbacks registered on [`SessionHostBuilder`].
#[derive(Clone)]
pub struct SessionHost {
    event_tx: mpsc::UnboundedSender<HostEvent>,
}

impl SessionHost {
    /// Replaces the draft, as when the user edits the input box.
    #[inline]
    pub fn set_input<S: Into<String>>(
        &self,
        input: S,
    ) -> Result<(), HostClosedError> {
        self.send(HostEvent::SetInput(input.into()))
    }

    /// Submits the current draft.
    #[inline]
    pub fn submit(&self) -> Result<(), HostClosedError> {
        self.send(HostEvent::Submit)
    }

    /// Replaces the draft and submits it.
    #[inline]
    pub fn submit_text<S: Into<String>>(
        &self,
        input: S,
    ) -> Result<(), HostClosedError> {
        self.set_input(input)?;
        self.submit()
    }

    /// Stops the host, abandoning a reply that is still streaming.
    #[inline]
    pub fn shutdown(&self) {
        self.send(HostEvent::Shutdown).ok();
    }

    #[inline]
    fn send(&self, event: HostEvent) -> Result<(), HostClosedError> {
        self.event_tx.send(event).map_err(|_| HostClosedError)
    }
}
