use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message as Frame;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use crate::chat::channel::{ChannelTransport, Connection};
use crate::error::ChatError;

use super::protocol::{self, CONNECT_FRAME, OutboundEvent, PONG_FRAME, Packet, WireEvent};

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsWriter = SplitSink<WsStream, Frame>;
type WsReader = SplitStream<WsStream>;

/// Live channel transport speaking Socket.IO v4 over a WebSocket.
///
/// Every `connect` opens a fresh socket, so a closed binding can never hand
/// its connection to the next one.
#[derive(Debug, Clone)]
pub struct SocketIoTransport {
    url: String,
}

impl SocketIoTransport {
    pub fn new(endpoint: &str) -> Self {
        let base = endpoint.trim_end_matches('/');
        Self {
            url: format!("{base}/?EIO=4&transport=websocket"),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl ChannelTransport for SocketIoTransport {
    async fn connect(&self) -> Result<Connection, ChatError> {
        log::debug!("Connecting chat socket to {}", self.url);
        let (stream, _) = connect_async(self.url.as_str())
            .await
            .map_err(|err| ChatError::ChannelUnavailable(err.to_string()))?;
        let (mut writer, mut reader) = stream.split();

        timeout(HANDSHAKE_TIMEOUT, handshake(&mut writer, &mut reader))
            .await
            .map_err(|_| ChatError::ChannelUnavailable("handshake timed out".to_string()))??;
        log::info!("Chat socket connected");

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        tokio::spawn(pump(writer, reader, outbound_rx, inbound_tx));

        Ok(Connection {
            outbound: outbound_tx,
            inbound: inbound_rx,
        })
    }
}

async fn handshake(writer: &mut WsWriter, reader: &mut WsReader) -> Result<(), ChatError> {
    let mut opened = false;

    while let Some(frame) = reader.next().await {
        let frame = frame.map_err(|err| ChatError::ChannelUnavailable(err.to_string()))?;
        let Frame::Text(text) = frame else {
            continue;
        };

        match protocol::decode(text.as_str()) {
            Ok(Packet::Open(handshake)) if !opened => {
                log::debug!("Engine.IO handshake: {handshake}");
                opened = true;
                send_text(writer, CONNECT_FRAME).await?;
            }
            Ok(Packet::Connect) if opened => return Ok(()),
            Ok(Packet::ConnectError(reason)) => {
                return Err(ChatError::ChannelUnavailable(reason));
            }
            Ok(Packet::Ping) => send_text(writer, PONG_FRAME).await?,
            Ok(other) => log::debug!("Ignoring {other:?} during handshake"),
            Err(err) => log::warn!("Bad frame during handshake `{}`: {err}", text.as_str()),
        }
    }

    Err(ChatError::ChannelUnavailable(
        "socket closed during handshake".to_string(),
    ))
}

async fn send_text(writer: &mut WsWriter, text: &str) -> Result<(), ChatError> {
    writer
        .send(Frame::text(text.to_string()))
        .await
        .map_err(|err| ChatError::ChannelUnavailable(err.to_string()))
}

async fn pump(
    mut writer: WsWriter,
    mut reader: WsReader,
    mut outbound: mpsc::UnboundedReceiver<OutboundEvent>,
    inbound: mpsc::UnboundedSender<WireEvent>,
) {
    loop {
        tokio::select! {
            event = outbound.recv() => {
                let Some(event) = event else {
                    log::debug!("Chat binding released; closing socket");
                    let _ = writer.send(Frame::Close(None)).await;
                    break;
                };
                match event.encode() {
                    Ok(frame) => {
                        if let Err(err) = send_text(&mut writer, &frame).await {
                            log::warn!("Failed to emit {}: {err}", event.name());
                            break;
                        }
                    }
                    Err(err) => log::warn!("Failed to encode {}: {err}", event.name()),
                }
            }
            frame = reader.next() => {
                match frame {
                    Some(Ok(Frame::Text(text))) => match protocol::decode(text.as_str()) {
                        Ok(Packet::Ping) => {
                            if send_text(&mut writer, PONG_FRAME).await.is_err() {
                                break;
                            }
                        }
                        Ok(Packet::Event(event)) => {
                            if inbound.send(event).is_err() {
                                break;
                            }
                        }
                        Ok(Packet::Close | Packet::Disconnect) => {
                            log::info!("Chat socket disconnected by server");
                            break;
                        }
                        Ok(other) => log::trace!("Ignoring packet {other:?}"),
                        Err(err) => log::warn!("Dropping malformed frame `{}`: {err}", text.as_str()),
                    },
                    Some(Ok(Frame::Close(_))) | None => {
                        log::info!("Chat socket closed");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        log::warn!("Chat socket error: {err}");
                        break;
                    }
                }
            }
        }
    }
}
