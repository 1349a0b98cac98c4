//! Relaybus broadcast relay.
//!
//! Accepts any number of client streams and fans every published message
//! out to all other participants, each copy stamped with a relay-wide
//! Lamport timestamp.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin relaybus-server
//! cargo run --bin relaybus-server -- --host 0.0.0.0 --port 3000
//! ```

use clap::Parser;
use relaybus_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "relaybus-server")]
#[command(about = "Broadcast relay with Lamport timestamps", long_about = None)]
struct Args {
    /// Host address to bind the relay to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the relay to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    if let Err(e) = relaybus_server::run_server(args.host, args.port).await {
        tracing::error!("relay error: {}", e);
        std::process::exit(1);
    }
}
