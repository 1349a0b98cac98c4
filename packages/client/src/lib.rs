//! Interactive client for the Relaybus broadcast relay.
//!
//! Drives one session: connect, publish lines from the terminal, render
//! incoming broadcasts with their Lamport times, and leave cleanly once
//! the relay acknowledges the disconnect.

pub mod error;
mod formatter;
mod session;
mod ui;

pub use session::run_client_session;
