//! Socket.IO v4 framing over Engine.IO v4 text frames.
//!
//! Only the subset the chat channel needs is understood: the Engine.IO
//! open/close/ping/pong/noop packets and the Socket.IO connect, disconnect,
//! event and connect-error packets on the default namespace.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::common::{ConversationKey, Message, SessionUser};
use crate::error::ChatError;

/// Sent by the client after the Engine.IO handshake to join namespace `/`.
pub const CONNECT_FRAME: &str = "40";
pub const PONG_FRAME: &str = "3";

pub const JOIN_CHAT: &str = "joinChat";
pub const SEND_MESSAGE: &str = "sendMessage";
pub const MESSAGE_RECEIVED: &str = "messageReceived";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("empty frame")]
    Empty,
    #[error("unknown packet type `{0}`")]
    UnknownPacket(String),
    #[error("invalid packet body: {0}")]
    InvalidBody(String),
    #[error("event packet without a name")]
    MissingEventName,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    Open(Value),
    Close,
    Ping,
    Pong,
    Noop,
    Connect,
    Disconnect,
    Event(WireEvent),
    ConnectError(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct WireEvent {
    pub name: String,
    pub payload: Value,
}

pub fn decode(frame: &str) -> Result<Packet, ProtocolError> {
    let mut chars = frame.chars();
    let kind = chars.next().ok_or(ProtocolError::Empty)?;
    let body = chars.as_str();

    match kind {
        '0' => serde_json::from_str(body)
            .map(Packet::Open)
            .map_err(|err| ProtocolError::InvalidBody(err.to_string())),
        '1' => Ok(Packet::Close),
        '2' => Ok(Packet::Ping),
        '3' => Ok(Packet::Pong),
        '4' => decode_socket_packet(body),
        '6' => Ok(Packet::Noop),
        other => Err(ProtocolError::UnknownPacket(other.to_string())),
    }
}

fn decode_socket_packet(body: &str) -> Result<Packet, ProtocolError> {
    let mut chars = body.chars();
    let kind = chars.next().ok_or(ProtocolError::Empty)?;
    let (namespace, rest) = split_namespace(chars.as_str());
    if namespace != "/" {
        return Ok(Packet::Noop);
    }

    match kind {
        '0' => Ok(Packet::Connect),
        '1' => Ok(Packet::Disconnect),
        '2' => decode_event(rest).map(Packet::Event),
        '4' => Ok(Packet::ConnectError(connect_error_message(rest))),
        other => Err(ProtocolError::UnknownPacket(format!("4{other}"))),
    }
}

/// Packets on any namespace other than `/` decode as `Noop`.
fn split_namespace(body: &str) -> (&str, &str) {
    if !body.starts_with('/') {
        return ("/", body);
    }
    body.split_once(',').unwrap_or((body, ""))
}

fn decode_event(body: &str) -> Result<WireEvent, ProtocolError> {
    // optional ack id
    let body = body.trim_start_matches(|c: char| c.is_ascii_digit());
    let parts: Vec<Value> =
        serde_json::from_str(body).map_err(|err| ProtocolError::InvalidBody(err.to_string()))?;

    let mut parts = parts.into_iter();
    let name = match parts.next() {
        Some(Value::String(name)) => name,
        _ => return Err(ProtocolError::MissingEventName),
    };

    Ok(WireEvent {
        name,
        payload: parts.next().unwrap_or(Value::Null),
    })
}

fn connect_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| value.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinChat {
    pub first_name: String,
    pub user_id: String,
    pub target_user_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessage {
    pub first_name: String,
    pub last_name: String,
    pub user_id: String,
    pub target_user_id: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundEvent {
    JoinChat(JoinChat),
    SendMessage(SendMessage),
}

impl OutboundEvent {
    pub fn join(user: &SessionUser, key: &ConversationKey) -> Self {
        OutboundEvent::JoinChat(JoinChat {
            first_name: user.first_name.clone(),
            user_id: key.self_id.clone(),
            target_user_id: key.peer_id.clone(),
        })
    }

    pub fn message(user: &SessionUser, key: &ConversationKey, text: impl Into<String>) -> Self {
        OutboundEvent::SendMessage(SendMessage {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            user_id: key.self_id.clone(),
            target_user_id: key.peer_id.clone(),
            text: text.into(),
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            OutboundEvent::JoinChat(_) => JOIN_CHAT,
            OutboundEvent::SendMessage(_) => SEND_MESSAGE,
        }
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        let payload = match self {
            OutboundEvent::JoinChat(join) => serde_json::to_value(join),
            OutboundEvent::SendMessage(send) => serde_json::to_value(send),
        }
        .map_err(|err| ProtocolError::InvalidBody(err.to_string()))?;

        let frame = serde_json::to_string(&(self.name(), payload))
            .map_err(|err| ProtocolError::InvalidBody(err.to_string()))?;
        Ok(format!("42{frame}"))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageReceived {
    first_name: String,
    last_name: String,
    text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    MessageReceived(Message),
}

impl InboundEvent {
    /// Validate a wire event against the inbound schema.
    ///
    /// Returns `Ok(None)` for event names the chat does not handle.
    pub fn from_wire(event: WireEvent) -> Result<Option<Self>, ChatError> {
        match event.name.as_str() {
            MESSAGE_RECEIVED => {
                let received: MessageReceived =
                    serde_json::from_value(event.payload).map_err(|err| {
                        ChatError::MalformedEvent {
                            event: event.name.clone(),
                            reason: err.to_string(),
                        }
                    })?;
                Ok(Some(InboundEvent::MessageReceived(Message::new(
                    received.first_name,
                    received.last_name,
                    received.text,
                ))))
            }
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_engine_packets() {
        assert_eq!(decode("2").unwrap(), Packet::Ping);
        assert_eq!(decode("3").unwrap(), Packet::Pong);
        assert_eq!(decode("1").unwrap(), Packet::Close);
        assert_eq!(decode("6").unwrap(), Packet::Noop);

        match decode(r#"0{"sid":"abc","pingInterval":25000}"#).unwrap() {
            Packet::Open(handshake) => assert_eq!(handshake["sid"], "abc"),
            other => panic!("unexpected packet {other:?}"),
        }
    }

    #[test]
    fn decodes_socket_packets() {
        assert_eq!(decode("40").unwrap(), Packet::Connect);
        assert_eq!(decode(r#"40{"sid":"xyz"}"#).unwrap(), Packet::Connect);
        assert_eq!(decode("41").unwrap(), Packet::Disconnect);
        assert_eq!(
            decode(r#"44{"message":"Not authorized"}"#).unwrap(),
            Packet::ConnectError("Not authorized".to_string())
        );
    }

    #[test]
    fn decodes_event_with_ack_id() {
        let frame = r#"427["messageReceived",{"firstName":"Bob","lastName":"B","text":"yo"}]"#;
        match decode(frame).unwrap() {
            Packet::Event(event) => {
                assert_eq!(event.name, "messageReceived");
                assert_eq!(event.payload["text"], "yo");
            }
            other => panic!("unexpected packet {other:?}"),
        }
    }

    #[test]
    fn other_namespaces_are_ignored() {
        let frame = r#"42/admin,["messageReceived",{"firstName":"Eve","lastName":"E","text":"hi"}]"#;
        assert_eq!(decode(frame).unwrap(), Packet::Noop);
        assert_eq!(decode("40/admin,").unwrap(), Packet::Noop);
        assert_eq!(decode("41/admin").unwrap(), Packet::Noop);
        assert_eq!(decode(r#"42/,["typing",{}]"#).unwrap(), Packet::Event(WireEvent {
            name: "typing".to_string(),
            payload: json!({}),
        }));
    }

    #[test]
    fn rejects_malformed_frames() {
        assert_eq!(decode(""), Err(ProtocolError::Empty));
        assert!(matches!(decode("9"), Err(ProtocolError::UnknownPacket(_))));
        assert!(matches!(decode("42not json"), Err(ProtocolError::InvalidBody(_))));
        assert_eq!(decode("42[1,2]"), Err(ProtocolError::MissingEventName));
    }

    #[test]
    fn encodes_send_message_with_camel_case_fields() {
        let user = SessionUser {
            id: "me".into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
        };
        let key = ConversationKey::new("me", "peer");
        let frame = OutboundEvent::message(&user, &key, "hello").encode().unwrap();

        assert!(frame.starts_with("42["));
        let parsed: Value = serde_json::from_str(&frame[2..]).unwrap();
        assert_eq!(
            parsed,
            json!(["sendMessage", {
                "firstName": "Ada",
                "lastName": "Lovelace",
                "userId": "me",
                "targetUserId": "peer",
                "text": "hello"
            }])
        );
    }

    #[test]
    fn inbound_schema_requires_all_fields() {
        let ok = WireEvent {
            name: MESSAGE_RECEIVED.into(),
            payload: json!({"firstName": "Bob", "lastName": "B", "text": "yo"}),
        };
        assert_eq!(
            InboundEvent::from_wire(ok).unwrap(),
            Some(InboundEvent::MessageReceived(Message::new("Bob", "B", "yo")))
        );

        let missing_text = WireEvent {
            name: MESSAGE_RECEIVED.into(),
            payload: json!({"firstName": "Bob", "lastName": "B"}),
        };
        assert!(matches!(
            InboundEvent::from_wire(missing_text),
            Err(ChatError::MalformedEvent { .. })
        ));

        let wrong_type = WireEvent {
            name: MESSAGE_RECEIVED.into(),
            payload: json!({"firstName": 1, "lastName": "B", "text": "yo"}),
        };
        assert!(InboundEvent::from_wire(wrong_type).is_err());

        let other = WireEvent {
            name: "typing".into(),
            payload: Value::Null,
        };
        assert_eq!(InboundEvent::from_wire(other).unwrap(), None);
    }
}
