//! Relay core: the connection registry plus the relay-wide Lamport clock.
//!
//! One `Relay` instance owns both pieces of shared mutable state and is
//! handed to every session handler by reference. Each item is guarded by
//! its own exclusion primitive and neither lock is ever held across a
//! network send.

use relaybus_shared::{
    clock::LamportClock,
    message::{ClientReference, Message},
};

use crate::registry::ConnectionRegistry;

/// Shared relay state: registry and clock.
#[derive(Default)]
pub struct Relay {
    registry: ConnectionRegistry,
    clock: LamportClock,
}

impl Relay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Fold a timestamp received from a client into the relay clock.
    pub fn observe(&self, received: u64) -> u64 {
        self.clock.observe(received)
    }

    /// Fan `message` out to every registered session except `exclude`.
    ///
    /// Recipients come from a registry snapshot taken up front, so the
    /// registry is free to mutate while the sends run. Each recipient's copy
    /// is stamped with a fresh clock tick; the ticks are serialized through
    /// the clock lock, so one broadcast's timestamps are distinct and
    /// increasing in snapshot order. An individual send failure is logged
    /// and skipped, never escalated to the publisher.
    pub async fn broadcast(&self, message: &Message, exclude: Option<&ClientReference>) {
        let recipients = self.registry.snapshot().await;
        for (reference, sink) in recipients {
            if exclude == Some(&reference) {
                continue;
            }
            let stamped = message.clone().stamped(self.clock.advance());
            if let Err(e) = sink.send(stamped).await {
                tracing::warn!(
                    "failed to deliver {:?} message to {}: {}",
                    message.kind,
                    reference,
                    e
                );
            }
        }
    }
}
