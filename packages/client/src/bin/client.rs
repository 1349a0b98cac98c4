//! Relaybus interactive client.
//!
//! Connects to the relay, publishes lines read from the terminal and prints
//! every other participant's messages together with the relay's Lamport
//! stamp and the client's own local time.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin relaybus-client -- --port 6001
//! cargo run --bin relaybus-client -- -p 6002 --url ws://127.0.0.1:8080/ws
//! ```

use clap::Parser;
use relaybus_shared::{logger::setup_logger, message::ClientReference};

#[derive(Parser, Debug)]
#[command(name = "relaybus-client")]
#[command(about = "Interactive client for the Relaybus broadcast relay", long_about = None)]
struct Args {
    /// Address part of this client's reference
    #[arg(short = 'a', long, default_value = "127.0.0.1")]
    address: String,

    /// Port part of this client's reference (must be unique per client)
    #[arg(short = 'p', long, default_value = "5500")]
    port: u16,

    /// Relay WebSocket URL
    #[arg(short = 'u', long, default_value = "ws://127.0.0.1:8080/ws")]
    url: String,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();
    let reference = ClientReference::new(args.address, args.port);

    if let Err(e) = relaybus_client::run_client_session(&args.url, reference).await {
        tracing::error!("client error: {}", e);
        std::process::exit(1);
    }
}
