//! Shared building blocks for the Relaybus broadcast message bus.
//!
//! The relay and the client both depend on this crate for the wire schema,
//! the Lamport clock and the logging setup.

pub mod clock;
pub mod logger;
pub mod message;

pub use clock::LamportClock;
pub use message::{ClientReference, Message, MessageKind};
