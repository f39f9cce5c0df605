use std::collections::VecDeque;
use std::fmt::{self, Debug};

use bytes::Bytes;
use stream_chat_endpoint::{ChatRequest, EndpointError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::Instrument;

use super::BusyPolicy;
use crate::endpoint_client::EndpointClient;
use crate::error::ExchangeError;
use crate::session::ChatSession;

type UpdateFn = Box<dyn Fn(&ChatSession) + Send + Sync>;
type IdleFn = Box<dyn Fn() + Send + Sync>;
type RejectedFn = Box<dyn Fn(&str) + Send + Sync>;

#[derive(Default)]
pub struct Callbacks {
    pub on_update: Option<UpdateFn>,
    pub on_idle: Option<IdleFn>,
    pub on_rejected: Option<RejectedFn>,
}

pub enum HostEvent {
    SetInput(String),
    Submit,
    Shutdown,
    Chunk {
        exchange_id: u64,
        chunk: Bytes,
    },
    StreamEnded {
        exchange_id: u64,
        result: Result<(), ExchangeError>,
    },
}

impl Debug for HostEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetInput(input) => {
                f.debug_tuple("SetInput").field(input).finish()
            }
            Self::Submit => f.write_str("Submit"),
            Self::Shutdown => f.write_str("Shutdown"),
            Self::Chunk { exchange_id, chunk } => f
                .debug_struct("Chunk")
                .field("exchange_id", exchange_id)
                .field("len", &chunk.len())
                .finish(),
            Self::StreamEnded {
                exchange_id,
                result,
            } => f
                .debug_struct("StreamEnded")
                .field("exchange_id", exchange_id)
                .field("result", result)
                .finish(),
        }
    }
}

pub struct HostState {
    session: ChatSession,
    client: EndpointClient,
    busy_policy: BusyPolicy,
    callbacks: Callbacks,
    queued_inputs: VecDeque<String>,
    // The exchange whose chunks are accepted. Chunks tagged with any other
    // id come from a stream that has already been abandoned.
    current_exchange: Option<u64>,
    next_exchange_id: u64,
    stream_task: Option<JoinHandle<()>>,
    event_tx: mpsc::WeakUnboundedSender<HostEvent>,
}

impl HostState {
    pub fn new(
        session: ChatSession,
        client: EndpointClient,
        busy_policy: BusyPolicy,
        callbacks: Callbacks,
        event_tx: mpsc::WeakUnboundedSender<HostEvent>,
    ) -> Self {
        Self {
            session,
            client,
            busy_policy,
            callbacks,
            queued_inputs: Default::default(),
            current_exchange: None,
            next_exchange_id: 1,
            stream_task: None,
            event_tx,
        }
    }

    /// Handles one event, returns `false` if the host should stop.
    fn handle_event(&mut self, event: HostEvent) -> bool {
        match event {
            HostEvent::SetInput(input) => {
                self.session.set_pending_input(input);
                self.notify_update();
            }
            HostEvent::Submit => self.submit(),
            HostEvent::Shutdown => return false,
            HostEvent::Chunk { exchange_id, chunk } => {
                if self.current_exchange != Some(exchange_id) {
                    trace!("discarding a chunk of exchange {exchange_id}");
                    return true;
                }
                match self.session.push_chunk(&chunk) {
                    Ok(true) => self.notify_update(),
                    Ok(false) => {}
                    Err(_) => {
                        // The session has already recorded the failure.
                        self.abandon_stream();
                        self.notify_update();
                        self.process_next_input();
                    }
                }
            }
            HostEvent::StreamEnded {
                exchange_id,
                result,
            } => {
                if self.current_exchange != Some(exchange_id) {
                    trace!("discarding the end of exchange {exchange_id}");
                    return true;
                }
                self.current_exchange = None;
                self.stream_task = None;
                match result {
                    Ok(()) => {
                        // A decode failure is recorded by the session itself.
                        self.session.finish_exchange().ok();
                    }
                    Err(err) => self.session.fail_exchange(&err),
                }
                self.notify_update();
                self.process_next_input();
            }
        }
        true
    }

    fn submit(&mut self) {
        if self.session.is_exchange_open() {
            match self.busy_policy {
                BusyPolicy::Reject => {
                    warn!("rejecting a submit while an exchange is open");
                    if let Some(on_rejected) = &self.callbacks.on_rejected {
                        on_rejected(self.session.pending_input());
                    }
                }
                BusyPolicy::Queue => {
                    if let Some(input) = self.session.take_submission() {
                        debug!("queueing a submit while an exchange is open");
                        self.queued_inputs.push_back(input);
                        self.notify_update();
                    }
                }
            }
            return;
        }

        match self.session.take_submission() {
            Some(input) => self.start_exchange(input),
            None => {
                trace!("ignoring an empty submit");
                self.process_next_input();
            }
        }
    }

    /// Starts the next queued input, or reports that the host is idle.
    fn process_next_input(&mut self) {
        if self.session.is_exchange_open() {
            return;
        }
        if let Some(input) = self.queued_inputs.pop_front() {
            self.start_exchange(input);
        } else if let Some(on_idle) = &self.callbacks.on_idle {
            on_idle();
        }
    }

    /// Opens an exchange, assuming no other exchange is open.
    fn start_exchange(&mut self, input: String) {
        let Some(event_tx) = self.event_tx.upgrade() else {
            // Every handle is gone, nobody is going to see the reply.
            return;
        };
        let request = match self.session.begin_exchange_with(input) {
            Ok(request) => request,
            Err(err) => {
                error!("cannot open an exchange: {err}");
                return;
            }
        };
        self.notify_update();

        let exchange_id = self.next_exchange_id;
        self.next_exchange_id += 1;
        self.current_exchange = Some(exchange_id);

        let client = self.client.clone();
        let task = tokio::spawn(
            stream_exchange(client, request, exchange_id, event_tx)
                .instrument(trace_span!("exchange", id = exchange_id)),
        );
        self.stream_task = Some(task);
    }

    fn abandon_stream(&mut self) {
        self.current_exchange = None;
        if let Some(task) = self.stream_task.take() {
            task.abort();
        }
    }

    #[inline]
    fn notify_update(&self) {
        if let Some(on_update) = &self.callbacks.on_update {
            on_update(&self.session);
        }
    }
}

pub async fn run_host(
    mut state: HostState,
    mut event_rx: mpsc::UnboundedReceiver<HostEvent>,
) {
    debug!("started");
    while let Some(event) = event_rx.recv().await {
        trace!("received event: {event:?}");
        if !state.handle_event(event) {
            break;
        }
    }
    state.abandon_stream();
    debug!("will terminate");
}

async fn stream_exchange(
    client: EndpointClient,
    request: ChatRequest,
    exchange_id: u64,
    event_tx: mpsc::UnboundedSender<HostEvent>,
) {
    let result = forward_chunks(&client, request, exchange_id, &event_tx)
        .await
        .map_err(|err| ExchangeError::from_endpoint(&*err));
    event_tx
        .send(HostEvent::StreamEnded {
            exchange_id,
            result,
        })
        .ok();
}

async fn forward_chunks(
    client: &EndpointClient,
    request: ChatRequest,
    exchange_id: u64,
    event_tx: &mpsc::UnboundedSender<HostEvent>,
) -> Result<(), Box<dyn EndpointError>> {
    let mut stream = client.send(request).await?;
    while let Some(chunk) = stream.next_chunk().await? {
        if event_tx.send(HostEvent::Chunk { exchange_id, chunk }).is_err() {
            // The host has stopped.
            break;
        }
    }
    Ok(())
}
