//! Error types for the relay.

use relaybus_shared::message::{ClientReference, MessageKind};
use thiserror::Error;

/// The send half of a session's stream is gone.
#[derive(Debug, Error)]
#[error("session stream is closed")]
pub struct SinkClosed;

/// Reasons a relay-side session terminates before its stream does.
///
/// Every variant is surfaced as a logged session termination; none of them
/// aborts the relay or any other session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The frame did not parse as a protocol message.
    #[error("malformed message: {0}")]
    Malformed(#[source] serde_json::Error),

    /// Connect and publish messages must carry a sender reference.
    #[error("{kind:?} message is missing its sender reference")]
    MissingSender { kind: MessageKind },

    /// A still-live session already owns this reference.
    #[error("client {0} is already connected")]
    AlreadyConnected(ClientReference),

    /// The message kind is not legal in the session's current state.
    #[error("unexpected {kind:?} message while {phase}")]
    UnexpectedMessage {
        kind: MessageKind,
        phase: &'static str,
    },
}
