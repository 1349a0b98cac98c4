//! Wire schema for the relay protocol.
//!
//! Every frame exchanged between a client and the relay is one [`Message`]
//! serialized as a single JSON object. Client-originated messages leave the
//! `logical_time` field at `0` ("not yet stamped"); the relay stamps each
//! broadcast copy on the send path.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identity of a participant, used as the registry key.
///
/// Two references are equal iff both `address` and `port` match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientReference {
    pub address: String,
    pub port: u16,
}

impl ClientReference {
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
        }
    }
}

impl fmt::Display for ClientReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.address, self.port)
    }
}

/// Protocol message kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Connect,
    Disconnect,
    Publish,
    Ack,
}

/// Unit of communication between clients and the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    /// Absent only on acks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<ClientReference>,
    /// Lamport timestamp. `0` means "unset" on client-originated messages.
    #[serde(default)]
    pub logical_time: u64,
}

impl Message {
    /// Connect message announcing `sender` to the relay.
    pub fn connect(sender: ClientReference) -> Self {
        Self {
            text: "connect".to_string(),
            kind: MessageKind::Connect,
            sender: Some(sender),
            logical_time: 0,
        }
    }

    /// User-published text from `sender`.
    pub fn publish(text: impl Into<String>, sender: ClientReference) -> Self {
        Self {
            text: text.into(),
            kind: MessageKind::Publish,
            sender: Some(sender),
            logical_time: 0,
        }
    }

    /// Disconnect request from `sender`.
    pub fn disconnect(sender: ClientReference) -> Self {
        Self {
            text: "disconnect".to_string(),
            kind: MessageKind::Disconnect,
            sender: Some(sender),
            logical_time: 0,
        }
    }

    /// Bare acknowledgment the relay sends back to a disconnecting client.
    /// Carries no sender reference and is not stamped.
    pub fn ack() -> Self {
        Self {
            text: "disconnect acknowledged".to_string(),
            kind: MessageKind::Ack,
            sender: None,
            logical_time: 0,
        }
    }

    /// Relay-originated notice that `reference` joined.
    pub fn join_notice(reference: ClientReference) -> Self {
        Self {
            text: "joined the relay".to_string(),
            kind: MessageKind::Connect,
            sender: Some(reference),
            logical_time: 0,
        }
    }

    /// Relay-originated notice that `reference` left.
    pub fn departure_notice(reference: ClientReference) -> Self {
        Self {
            text: "left the relay".to_string(),
            kind: MessageKind::Disconnect,
            sender: Some(reference),
            logical_time: 0,
        }
    }

    /// Copy of this message carrying the given Lamport timestamp.
    pub fn stamped(mut self, logical_time: u64) -> Self {
        self.logical_time = logical_time;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ack_serializes_without_sender() {
        // given:
        let ack = Message::ack();

        // when:
        let json = serde_json::to_string(&ack).unwrap();

        // then: the sender key must be absent, not null
        assert!(!json.contains("sender"));
        assert!(json.contains(r#""type":"ack""#));
    }

    #[test]
    fn test_missing_logical_time_deserializes_as_unset() {
        // given: a frame from a client that never stamps
        let json = r#"{"text":"hi","type":"publish","sender":{"address":"127.0.0.1","port":6001}}"#;

        // when:
        let msg: Message = serde_json::from_str(json).unwrap();

        // then:
        assert_eq!(msg.logical_time, 0);
        assert_eq!(msg.kind, MessageKind::Publish);
        assert_eq!(msg.sender, Some(ClientReference::new("127.0.0.1", 6001)));
    }

    #[test]
    fn test_stamped_copy_carries_timestamp() {
        // given:
        let reference = ClientReference::new("127.0.0.1", 6001);
        let msg = Message::publish("hi", reference);

        // when:
        let stamped = msg.clone().stamped(42);

        // then: only the timestamp differs
        assert_eq!(stamped.logical_time, 42);
        assert_eq!(stamped.text, msg.text);
        assert_eq!(stamped.sender, msg.sender);
    }

    #[test]
    fn test_client_reference_equality_is_field_wise() {
        // given:
        let a = ClientReference::new("127.0.0.1", 6001);
        let b = ClientReference::new("127.0.0.1", 6001);
        let c = ClientReference::new("127.0.0.1", 6002);

        // then:
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.to_string(), "127.0.0.1:6001");
    }
}
