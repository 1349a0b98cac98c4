//! Connection registry: the authoritative set of currently connected
//! sessions.
//!
//! Identity (a [`ClientReference`]) is kept separate from the channel: the
//! registry and the fan-out logic only ever see an abstract send capability,
//! never a concrete transport type. Sessions are registered on receipt of a
//! connect message and removed on disconnect or on their own error path.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use relaybus_shared::message::{ClientReference, Message};
use tokio::sync::{Mutex, mpsc};

use crate::error::{SessionError, SinkClosed};

/// Send capability for one session's outbound stream.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Hand one message to the session's outbound stream.
    async fn send(&self, message: Message) -> Result<(), SinkClosed>;
}

/// Shared handle to a session's send capability.
pub type SharedSink = Arc<dyn MessageSink>;

/// [`MessageSink`] backed by the unbounded channel feeding a session's
/// outbound pump task. Sending never blocks; a slow peer only backs up its
/// own pump.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Message>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<Message>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl MessageSink for ChannelSink {
    async fn send(&self, message: Message) -> Result<(), SinkClosed> {
        self.tx.send(message).map_err(|_| SinkClosed)
    }
}

/// Thread-safe map of connected client references to their send capability.
#[derive(Default)]
pub struct ConnectionRegistry {
    sessions: Mutex<HashMap<ClientReference, SharedSink>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the entry for `reference`.
    ///
    /// A reference that is already registered is rejected: the routing entry
    /// of a live session is never silently replaced.
    pub async fn register(
        &self,
        reference: ClientReference,
        sink: SharedSink,
    ) -> Result<(), SessionError> {
        let mut sessions = self.sessions.lock().await;
        if sessions.contains_key(&reference) {
            return Err(SessionError::AlreadyConnected(reference));
        }
        sessions.insert(reference, sink);
        Ok(())
    }

    /// Remove the entry if present. An absent reference is not an error;
    /// returns whether anything was removed.
    pub async fn deregister(&self, reference: &ClientReference) -> bool {
        let mut sessions = self.sessions.lock().await;
        sessions.remove(reference).is_some()
    }

    /// Consistent point-in-time copy of all (reference, sink) pairs.
    ///
    /// Fan-out iterates the copy outside the lock, so a broadcast in
    /// progress never blocks registrations or deregistrations.
    pub async fn snapshot(&self) -> Vec<(ClientReference, SharedSink)> {
        let sessions = self.sessions.lock().await;
        sessions
            .iter()
            .map(|(reference, sink)| (reference.clone(), sink.clone()))
            .collect()
    }

    pub async fn contains(&self, reference: &ClientReference) -> bool {
        let sessions = self.sessions.lock().await;
        sessions.contains_key(reference)
    }

    pub async fn len(&self) -> usize {
        let sessions = self.sessions.lock().await;
        sessions.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel_sink() -> (SharedSink, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(ChannelSink::new(tx)), rx)
    }

    #[tokio::test]
    async fn test_register_and_deregister() {
        // given:
        let registry = ConnectionRegistry::new();
        let alice = ClientReference::new("127.0.0.1", 6001);
        let (sink, _rx) = channel_sink();

        // when:
        registry.register(alice.clone(), sink).await.unwrap();

        // then:
        assert!(registry.contains(&alice).await);
        assert_eq!(registry.len().await, 1);

        assert!(registry.deregister(&alice).await);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_duplicate_register_is_rejected() {
        // given: alice is already registered
        let registry = ConnectionRegistry::new();
        let alice = ClientReference::new("127.0.0.1", 6001);
        let (first, mut first_rx) = channel_sink();
        let (second, _second_rx) = channel_sink();
        registry.register(alice.clone(), first).await.unwrap();

        // when:
        let result = registry.register(alice.clone(), second).await;

        // then: the first session's routing entry survives
        assert!(matches!(result, Err(SessionError::AlreadyConnected(_))));
        let snapshot = registry.snapshot().await;
        assert_eq!(snapshot.len(), 1);
        snapshot[0].1.send(Message::ack()).await.unwrap();
        assert!(first_rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_deregister_absent_reference_is_a_noop() {
        // given:
        let registry = ConnectionRegistry::new();
        let ghost = ClientReference::new("127.0.0.1", 9999);

        // when / then:
        assert!(!registry.deregister(&ghost).await);
    }

    #[tokio::test]
    async fn test_snapshot_is_a_point_in_time_copy() {
        // given:
        let registry = ConnectionRegistry::new();
        let alice = ClientReference::new("127.0.0.1", 6001);
        let bob = ClientReference::new("127.0.0.1", 6002);
        let (alice_sink, _a) = channel_sink();
        let (bob_sink, _b) = channel_sink();
        registry.register(alice.clone(), alice_sink).await.unwrap();
        registry.register(bob.clone(), bob_sink).await.unwrap();

        // when: the registry mutates after the snapshot is taken
        let snapshot = registry.snapshot().await;
        registry.deregister(&alice).await;

        // then: the copy is unaffected
        assert_eq!(snapshot.len(), 2);
        assert_eq!(registry.len().await, 1);
    }
}
