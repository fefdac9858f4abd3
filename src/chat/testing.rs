//! In-memory stand-ins for the history and channel transports.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::{Value, json};
use tokio::sync::{mpsc, oneshot};

use crate::common::SessionUser;
use crate::error::ChatError;
use crate::network::protocol::{MESSAGE_RECEIVED, OutboundEvent, WireEvent};

use super::channel::{ChannelTransport, Connection};
use super::history::{HistorySource, RawChatMessage, RawSender};

pub fn alice() -> SessionUser {
    SessionUser {
        id: "alice".to_string(),
        first_name: "Alice".to_string(),
        last_name: "Anders".to_string(),
    }
}

pub fn raw(first_name: &str, last_name: &str, text: &str) -> RawChatMessage {
    RawChatMessage {
        sender_id: Some(RawSender {
            first_name: Some(first_name.to_string()),
            last_name: Some(last_name.to_string()),
        }),
        text: text.to_string(),
    }
}

/// The server side of one loopback connection.
pub struct ServerEnd {
    to_client: mpsc::UnboundedSender<WireEvent>,
    from_client: mpsc::UnboundedReceiver<OutboundEvent>,
}

impl ServerEnd {
    pub fn push_raw(&self, name: &str, payload: Value) -> bool {
        self.to_client
            .send(WireEvent {
                name: name.to_string(),
                payload,
            })
            .is_ok()
    }

    pub fn push_message(&self, first_name: &str, last_name: &str, text: &str) -> bool {
        self.push_raw(
            MESSAGE_RECEIVED,
            json!({"firstName": first_name, "lastName": last_name, "text": text}),
        )
    }

    pub async fn next_emit(&mut self) -> Option<OutboundEvent> {
        self.from_client.recv().await
    }

    /// Whether the client side has released this connection.
    pub fn is_released(&self) -> bool {
        self.to_client.is_closed()
    }
}

pub struct LoopbackTransport {
    servers: mpsc::UnboundedSender<ServerEnd>,
    refuse: AtomicBool,
    connects: AtomicUsize,
}

impl LoopbackTransport {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<ServerEnd>) {
        let (servers, server_rx) = mpsc::unbounded_channel();
        let transport = Arc::new(Self {
            servers,
            refuse: AtomicBool::new(false),
            connects: AtomicUsize::new(0),
        });
        (transport, server_rx)
    }

    pub fn refuse_connections(&self) {
        self.refuse.store(true, Ordering::SeqCst);
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

impl ChannelTransport for LoopbackTransport {
    async fn connect(&self) -> Result<Connection, ChatError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.refuse.load(Ordering::SeqCst) {
            return Err(ChatError::ChannelUnavailable("connection refused".to_string()));
        }

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let _ = self.servers.send(ServerEnd {
            to_client: inbound_tx,
            from_client: outbound_rx,
        });

        Ok(Connection {
            outbound: outbound_tx,
            inbound: inbound_rx,
        })
    }
}

type Reply = Result<Vec<RawChatMessage>, ChatError>;

/// History source whose responses are released by the test, per peer.
#[derive(Default)]
pub struct GatedHistory {
    gates: Mutex<HashMap<String, oneshot::Receiver<Reply>>>,
    calls: AtomicUsize,
}

impl GatedHistory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Hold the next fetch for `peer_id` until the returned sender fires.
    pub fn gate(&self, peer_id: &str) -> oneshot::Sender<Reply> {
        let (tx, rx) = oneshot::channel();
        if let Ok(mut gates) = self.gates.lock() {
            gates.insert(peer_id.to_string(), rx);
        }
        tx
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl HistorySource for GatedHistory {
    async fn fetch_transcript(&self, peer_id: &str) -> Result<Vec<RawChatMessage>, ChatError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gate = self
            .gates
            .lock()
            .ok()
            .and_then(|mut gates| gates.remove(peer_id));

        match gate {
            Some(gate) => gate
                .await
                .unwrap_or_else(|_| Err(ChatError::Transport("gate dropped".to_string()))),
            None => Ok(Vec::new()),
        }
    }
}
