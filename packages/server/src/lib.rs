//! Broadcast relay for the Relaybus message bus.
//!
//! Clients open one long-lived bidirectional stream each; the relay
//! registers them on connect, fans every published message out to all
//! other participants with a relay-wide Lamport timestamp per copy, and
//! acknowledges clean disconnects.

pub mod error;
mod handler;
pub mod registry;
pub mod relay;
mod runner;
mod signal;

pub use runner::{router, run_server};
