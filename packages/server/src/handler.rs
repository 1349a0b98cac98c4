//! WebSocket session handling for the relay.
//!
//! One task per inbound stream drives a [`SessionHandler`] state machine;
//! a second task per session pumps outbound messages from the registry sink
//! to the WebSocket, so a slow peer only ever blocks its own pump.

use std::sync::Arc;

use axum::{
    Json,
    extract::{
        State,
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use relaybus_shared::message::{ClientReference, Message, MessageKind};
use tokio::sync::mpsc;

use crate::{
    error::SessionError,
    registry::{ChannelSink, SharedSink},
    relay::Relay,
};

/// Protocol states of one relay-side session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionPhase {
    AwaitingConnect,
    Active,
    Terminated,
}

impl SessionPhase {
    fn name(self) -> &'static str {
        match self {
            Self::AwaitingConnect => "awaiting connect",
            Self::Active => "active",
            Self::Terminated => "terminated",
        }
    }
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(relay): State<Arc<Relay>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, relay))
}

async fn handle_socket(socket: WebSocket, relay: Arc<Relay>) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

    // Outbound pump: everything the registry hands this session goes out
    // through here. The loop ends once every sender clone is gone and the
    // queue has drained, which flushes a pending ack before the socket
    // closes.
    let pump = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let json = match serde_json::to_string(&message) {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!("failed to serialize outbound message: {}", e);
                    continue;
                }
            };
            if ws_tx.send(WsMessage::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let mut session = SessionHandler::new(relay, Arc::new(ChannelSink::new(tx)));

    while session.phase() != SessionPhase::Terminated {
        let frame = match ws_rx.next().await {
            Some(Ok(frame)) => frame,
            Some(Err(e)) => {
                tracing::warn!("stream receive error: {}", e);
                break;
            }
            None => break,
        };

        match frame {
            WsMessage::Text(text) => {
                let message = match serde_json::from_str::<Message>(&text) {
                    Ok(message) => message,
                    Err(e) => {
                        tracing::warn!("terminating session: {}", SessionError::Malformed(e));
                        break;
                    }
                };
                if let Err(e) = session.handle_message(message).await {
                    tracing::warn!("terminating session: {}", e);
                    break;
                }
            }
            WsMessage::Close(_) => break,
            // Ping/pong is handled by the protocol layer.
            _ => {}
        }
    }

    // Abrupt paths land here with the session still registered; a clean
    // disconnect has already removed it.
    session.finish().await;

    // Dropping the handler releases the last local sender clone so the pump
    // can drain and exit.
    drop(session);
    let _ = pump.await;
}

/// Relay-side protocol state machine for one client stream.
///
/// Sees only parsed messages and the session's send capability; transport
/// concerns stay in [`handle_socket`]. Owns the session's registration
/// lifecycle: an entry added on connect is removed either by a clean
/// disconnect or by [`SessionHandler::finish`] on the error path.
struct SessionHandler {
    relay: Arc<Relay>,
    sink: SharedSink,
    phase: SessionPhase,
    reference: Option<ClientReference>,
}

impl SessionHandler {
    fn new(relay: Arc<Relay>, sink: SharedSink) -> Self {
        Self {
            relay,
            sink,
            phase: SessionPhase::AwaitingConnect,
            reference: None,
        }
    }

    fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Apply one inbound message to the state machine.
    ///
    /// An error means the session must terminate; the caller performs the
    /// abrupt-disconnect cleanup via [`SessionHandler::finish`].
    async fn handle_message(&mut self, message: Message) -> Result<(), SessionError> {
        // Lamport receive rule. Client frames normally carry the 0 sentinel.
        if message.logical_time != 0 {
            self.relay.observe(message.logical_time);
        }

        match (self.phase, message.kind) {
            (SessionPhase::AwaitingConnect, MessageKind::Connect) => self.on_connect(message).await,
            (SessionPhase::Active, MessageKind::Publish) => self.on_publish(message).await,
            (SessionPhase::Active, MessageKind::Disconnect) => self.on_disconnect().await,
            (phase, kind) => Err(SessionError::UnexpectedMessage {
                kind,
                phase: phase.name(),
            }),
        }
    }

    async fn on_connect(&mut self, message: Message) -> Result<(), SessionError> {
        let reference = message.sender.ok_or(SessionError::MissingSender {
            kind: MessageKind::Connect,
        })?;

        self.relay
            .registry()
            .register(reference.clone(), self.sink.clone())
            .await?;
        self.reference = Some(reference.clone());
        self.phase = SessionPhase::Active;
        tracing::info!("client {} connected", reference);

        // Everyone learns about the join, the joiner included.
        self.relay
            .broadcast(&Message::join_notice(reference), None)
            .await;
        Ok(())
    }

    async fn on_publish(&mut self, message: Message) -> Result<(), SessionError> {
        if message.sender.is_none() {
            return Err(SessionError::MissingSender {
                kind: MessageKind::Publish,
            });
        }

        // Exclusion is keyed by the registered identity, not by the frame.
        if let Some(reference) = self.reference.clone() {
            self.relay.broadcast(&message, Some(&reference)).await;
        }
        Ok(())
    }

    async fn on_disconnect(&mut self) -> Result<(), SessionError> {
        // The ack goes straight back on this session's own stream, unstamped.
        if let Err(e) = self.sink.send(Message::ack()).await {
            tracing::warn!("failed to deliver disconnect ack: {}", e);
        }

        if let Some(reference) = self.reference.take() {
            self.relay
                .broadcast(&Message::departure_notice(reference.clone()), Some(&reference))
                .await;
            self.relay.registry().deregister(&reference).await;
            tracing::info!("client {} disconnected", reference);
        }

        self.phase = SessionPhase::Terminated;
        Ok(())
    }

    /// Abrupt-disconnect cleanup: drop the registration without a departure
    /// broadcast. A no-op after a clean disconnect.
    async fn finish(&mut self) {
        if self.phase == SessionPhase::Terminated {
            return;
        }
        self.phase = SessionPhase::Terminated;
        if let Some(reference) = self.reference.take() {
            self.relay.registry().deregister(&reference).await;
            tracing::warn!("client {} dropped without a disconnect", reference);
        }
    }
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}
