use stream_chat_endpoint::ChatEndpoint;
use tokio::sync::mpsc;
use tracing::Instrument;

use super::state::{Callbacks, HostState, run_host};
use super::{BusyPolicy, SessionHost};
use crate::decoder::DecodeMode;
use crate::endpoint_client::EndpointClient;
use crate::session::ChatSession;

/// [`SessionHost`] builder.
pub struct SessionHostBuilder {
    client: EndpointClient,
    decode_mode: DecodeMode,
    busy_policy: BusyPolicy,
    callbacks: Callbacks,
}

impl SessionHostBuilder {
    /// Creates a new builder with the specified endpoint.
    #[inline]
    pub fn with_endpoint<E: ChatEndpoint + 'static>(endpoint: E) -> Self {
        Self::with_client(EndpointClient::new(endpoint))
    }

    /// Creates a new builder with an existing client.
    #[inline]
    pub fn with_client(client: EndpointClient) -> Self {
        Self {
            client,
            decode_mode: DecodeMode::default(),
            busy_policy: BusyPolicy::default(),
            callbacks: Callbacks::default(),
        }
    }

    /// Sets how reply bodies are decoded.
    #[inline]
    pub fn with_decode_mode(mut self, mode: DecodeMode) -> Self {
        self.decode_mode = mode;
        self
    }

    /// Sets what happens to a submit while a reply is streaming.
    #[inline]
    pub fn with_busy_policy(mut self, policy: BusyPolicy) -> Self {
        self.busy_policy = policy;
        self
    }

    /// Attaches a callback to be invoked after every change to the session.
    #[inline]
    pub fn on_update(
        mut self,
        on_update: impl Fn(&ChatSession) + Send + Sync + 'static,
    ) -> Self {
        self.callbacks.on_update = Some(Box::new(on_update));
        self
    }

    /// Attaches a callback to be invoked when the host has nothing left to
    /// do.
    #[inline]
    pub fn on_idle(
        mut self,
        on_idle: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        self.callbacks.on_idle = Some(Box::new(on_idle));
        self
    }

    /// Attaches a callback to be invoked with the draft of a rejected
    /// submit.
    #[inline]
    pub fn on_rejected(
        mut self,
        on_rejected: impl Fn(&str) + Send + Sync + 'static,
    ) -> Self {
        self.callbacks.on_rejected = Some(Box::new(on_rejected));
        self
    }

    /// Builds the host and spawns its task.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn build(self) -> SessionHost {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let state = HostState::new(
            ChatSession::with_decode_mode(self.decode_mode),
            self.client,
            self.busy_policy,
            self.callbacks,
            event_tx.downgrade(),
        );
        tokio::spawn(
            run_host(state, event_rx).instrument(trace_span!("session host")),
        );
        SessionHost { event_tx }
    }
}
