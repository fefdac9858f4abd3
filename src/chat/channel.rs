use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::common::{ConversationKey, Message, SessionUser};
use crate::error::ChatError;
use crate::network::protocol::{InboundEvent, OutboundEvent, WireEvent};

/// One established transport connection, seen as a pair of queues.
pub struct Connection {
    pub outbound: mpsc::UnboundedSender<OutboundEvent>,
    pub inbound: mpsc::UnboundedReceiver<WireEvent>,
}

/// Opens live event connections. Each call must return a fresh connection.
pub trait ChannelTransport: Send + Sync + 'static {
    fn connect(&self) -> impl Future<Output = Result<Connection, ChatError>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelStatus {
    Connecting,
    Open,
    /// The connection failed or was lost. The binding still needs `close`.
    Unavailable,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    Connected,
    Message(Message),
    Unavailable(String),
}

type Listener = Box<dyn Fn(ChannelEvent) + Send>;

struct Shared {
    status: ChannelStatus,
    listener: Option<Listener>,
}

#[derive(Clone)]
struct BindingState(Arc<Mutex<Shared>>);

impl BindingState {
    fn new(listener: Listener) -> Self {
        Self(Arc::new(Mutex::new(Shared {
            status: ChannelStatus::Connecting,
            listener: Some(listener),
        })))
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn status(&self) -> ChannelStatus {
        self.lock().status
    }

    /// Delivery happens under the lock, so once `release` returns no
    /// listener call is in flight. Returns `false` once released.
    fn deliver(&self, event: ChannelEvent) -> bool {
        let mut shared = self.lock();
        if shared.status == ChannelStatus::Closed {
            return false;
        }

        match &event {
            ChannelEvent::Connected if shared.status == ChannelStatus::Connecting => {
                shared.status = ChannelStatus::Open;
            }
            ChannelEvent::Unavailable(_) => shared.status = ChannelStatus::Unavailable,
            _ => {}
        }

        match shared.listener.as_ref() {
            Some(listener) => {
                listener(event);
                true
            }
            None => false,
        }
    }

    /// Returns `false` if the binding was already released.
    fn release(&self) -> bool {
        let mut shared = self.lock();
        if shared.status == ChannelStatus::Closed {
            return false;
        }
        shared.status = ChannelStatus::Closed;
        shared.listener = None;
        true
    }
}

/// A live channel scoped to one conversation.
///
/// Dropping a binding releases it as well, but callers are expected to go
/// through [`ChannelManager::close`].
pub struct ChannelBinding {
    id: u64,
    key: ConversationKey,
    user: SessionUser,
    outbound: mpsc::UnboundedSender<OutboundEvent>,
    state: BindingState,
    pump: Option<JoinHandle<()>>,
}

impl ChannelBinding {
    #[cfg(test)]
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn status(&self) -> ChannelStatus {
        self.state.status()
    }

    pub fn is_open(&self) -> bool {
        self.status() == ChannelStatus::Open
    }

    fn release(&mut self) -> bool {
        let released = self.state.release();
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
        released
    }
}

impl Drop for ChannelBinding {
    fn drop(&mut self) {
        if self.release() {
            log::debug!("Channel binding {} released on drop", self.id);
        }
    }
}

/// Owns live channel acquisition and enforces one binding per self user.
pub struct ChannelManager<T> {
    transport: Arc<T>,
    runtime: Handle,
    next_id: u64,
    active: HashMap<String, (u64, BindingState)>,
}

impl<T: ChannelTransport> ChannelManager<T> {
    pub fn new(transport: Arc<T>, runtime: Handle) -> Self {
        Self {
            transport,
            runtime,
            next_id: 0,
            active: HashMap::new(),
        }
    }

    pub fn is_bound(&self, self_id: &str) -> bool {
        self.active
            .get(self_id)
            .is_some_and(|(_, state)| state.status() != ChannelStatus::Closed)
    }

    /// Open a channel for `key` and announce presence on it.
    ///
    /// Does not wait for the connection: `on_event` receives
    /// [`ChannelEvent::Connected`] or [`ChannelEvent::Unavailable`] later.
    pub fn open<F>(
        &mut self,
        key: &ConversationKey,
        user: &SessionUser,
        on_event: F,
    ) -> Result<ChannelBinding, ChatError>
    where
        F: Fn(ChannelEvent) + Send + 'static,
    {
        if !key.is_complete() {
            return Err(ChatError::InvalidKey);
        }
        if self.is_bound(&key.self_id) {
            return Err(ChatError::AlreadyBound(key.self_id.clone()));
        }

        self.next_id += 1;
        let id = self.next_id;
        let state = BindingState::new(Box::new(on_event));

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        // joinChat is queued first so it precedes anything sent on this binding
        outbound_tx
            .send(OutboundEvent::join(user, key))
            .map_err(|_| ChatError::ChannelUnavailable("outbound queue closed".to_string()))?;

        let pump = self.runtime.spawn(run_binding(
            self.transport.clone(),
            id,
            outbound_rx,
            state.clone(),
        ));

        self.active
            .insert(key.self_id.clone(), (id, state.clone()));
        log::info!(
            "Opened chat binding {id} for {} -> {}",
            key.self_id,
            key.peer_id
        );

        Ok(ChannelBinding {
            id,
            key: key.clone(),
            user: user.clone(),
            outbound: outbound_tx,
            state,
            pump: Some(pump),
        })
    }

    /// Release the binding. After this returns its listener is never called
    /// again. Closing an already closed binding is a no-op.
    pub fn close(&mut self, binding: &mut ChannelBinding) {
        if !binding.release() {
            return;
        }

        let owns_slot = self
            .active
            .get(&binding.key.self_id)
            .is_some_and(|(id, _)| *id == binding.id);
        if owns_slot {
            self.active.remove(&binding.key.self_id);
        }
        log::info!("Closed chat binding {}", binding.id);
    }

    /// Publish a message. Fire-and-forget: nothing is appended locally.
    pub fn send(&self, binding: &ChannelBinding, text: &str) -> Result<(), ChatError> {
        match binding.status() {
            ChannelStatus::Open => {}
            status => {
                return Err(ChatError::ChannelUnavailable(format!(
                    "channel is {status:?}"
                )));
            }
        }

        binding
            .outbound
            .send(OutboundEvent::message(&binding.user, &binding.key, text))
            .map_err(|_| ChatError::ChannelUnavailable("channel closed".to_string()))
    }
}

async fn run_binding<T: ChannelTransport>(
    transport: Arc<T>,
    id: u64,
    mut outbound: mpsc::UnboundedReceiver<OutboundEvent>,
    state: BindingState,
) {
    let mut connection = match transport.connect().await {
        Ok(connection) => connection,
        Err(err) => {
            log::warn!("Chat binding {id} could not connect: {err}");
            state.deliver(ChannelEvent::Unavailable(err.to_string()));
            return;
        }
    };

    if !state.deliver(ChannelEvent::Connected) {
        return;
    }

    loop {
        tokio::select! {
            event = outbound.recv() => {
                let Some(event) = event else {
                    break;
                };
                if connection.outbound.send(event).is_err() {
                    state.deliver(ChannelEvent::Unavailable("connection closed".to_string()));
                    break;
                }
            }
            frame = connection.inbound.recv() => {
                let Some(frame) = frame else {
                    log::info!("Chat binding {id} lost its connection");
                    state.deliver(ChannelEvent::Unavailable("connection lost".to_string()));
                    break;
                };
                match InboundEvent::from_wire(frame) {
                    Ok(Some(InboundEvent::MessageReceived(message))) => {
                        if !state.deliver(ChannelEvent::Message(message)) {
                            break;
                        }
                    }
                    Ok(None) => log::debug!("Chat binding {id} ignoring unhandled event"),
                    Err(err) => log::warn!("Chat binding {id} dropping inbound event: {err}"),
                }
            }
        }
    }
}
