//! Error types for the Relaybus client.

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// The relay could not be reached at all
    #[error("failed to connect to the relay: {0}")]
    Connect(String),

    /// Fatal transport failure after the session was established
    #[error("transport error: {0}")]
    Transport(String),

    /// The stream ended before the relay acknowledged our disconnect
    #[error("stream ended before the disconnect was acknowledged")]
    MissingAck,
}
