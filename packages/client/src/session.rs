//! Client protocol driver: one interactive session against the relay.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use relaybus_shared::{
    clock::LamportClock,
    message::{ClientReference, Message, MessageKind},
};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message as WsMessage};

use crate::{error::ClientError, formatter::MessageFormatter, ui::redisplay_prompt};

/// How the receive task ended.
enum SessionEnd {
    /// The relay acknowledged our disconnect.
    Acknowledged,
}

/// Run one interactive session against the relay at `url`.
///
/// Connects as `reference`, publishes lines read from the terminal and
/// renders every broadcast received in the meantime, each with its relay
/// stamp and the client's own Lamport time. Typing "exit" (or closing
/// stdin) sends a disconnect; the driver then blocks until the relay's ack
/// arrives before returning. Any transport failure after the session is
/// established is fatal.
pub async fn run_client_session(url: &str, reference: ClientReference) -> Result<(), ClientError> {
    let (ws_stream, _response) = connect_async(url)
        .await
        .map_err(|e| ClientError::Connect(e.to_string()))?;

    tracing::info!("connected to the relay at {}", url);

    let clock = Arc::new(LamportClock::new());
    let (mut write, mut read) = ws_stream.split();

    send_frame(&mut write, &Message::connect(reference.clone())).await?;
    clock.advance();

    println!(
        "\nYou are '{}'. Type messages and press Enter to publish. Type 'exit' to leave.\n",
        reference
    );

    let prompt_label = reference.to_string();

    // Receive task: keeps the local clock in sync with every stamped frame
    // and watches for the disconnect ack.
    let read_clock = clock.clone();
    let read_label = prompt_label.clone();
    let mut read_task = tokio::spawn(async move {
        while let Some(frame) = read.next().await {
            let frame = frame.map_err(|e| ClientError::Transport(e.to_string()))?;
            let text = match frame {
                WsMessage::Text(text) => text,
                WsMessage::Close(_) => {
                    return Err(ClientError::Transport("relay closed the stream".to_string()));
                }
                _ => continue,
            };

            let message = match serde_json::from_str::<Message>(&text) {
                Ok(message) => message,
                Err(e) => {
                    tracing::warn!("ignoring unparseable frame: {}", e);
                    print!("{}", MessageFormatter::format_raw(&text));
                    redisplay_prompt(&read_label);
                    continue;
                }
            };

            let local_time = if message.logical_time != 0 {
                read_clock.observe(message.logical_time)
            } else {
                read_clock.current()
            };

            if message.kind == MessageKind::Ack {
                return Ok(SessionEnd::Acknowledged);
            }

            print!("{}", MessageFormatter::format_message(&message, local_time));
            redisplay_prompt(&read_label);
        }
        Err(ClientError::MissingAck)
    });

    // Blocking readline thread bridged into the async send loop (rustyline
    // is synchronous).
    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();
    let readline_label = prompt_label.clone();
    std::thread::spawn(move || {
        let mut editor = match DefaultEditor::new() {
            Ok(editor) => editor,
            Err(e) => {
                eprintln!("failed to initialize readline: {}", e);
                return;
            }
        };

        let prompt = format!("{}> ", readline_label);
        loop {
            match editor.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim().to_string();
                    if line.is_empty() {
                        continue;
                    }
                    editor.add_history_entry(&line).ok();
                    let leaving = line == "exit";
                    if input_tx.send(line).is_err() || leaving {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(e) => {
                    tracing::error!("readline error: {}", e);
                    break;
                }
            }
        }
    });

    // Send loop: publish lines until the user leaves, then disconnect. The
    // local clock advances once per message handed to the stream.
    let write_clock = clock.clone();
    let write_reference = reference.clone();
    let mut write_task = tokio::spawn(async move {
        loop {
            // A closed input channel (ctrl-c / ctrl-d) leaves cleanly too.
            let Some(line) = input_rx.recv().await else {
                break;
            };
            if line == "exit" {
                break;
            }
            send_frame(&mut write, &Message::publish(line, write_reference.clone())).await?;
            write_clock.advance();
        }

        send_frame(&mut write, &Message::disconnect(write_reference)).await?;
        write_clock.advance();
        Ok::<(), ClientError>(())
    });

    // The driver finishes once the disconnect has been sent AND the ack has
    // come back; a receive-side failure ends everything immediately.
    tokio::select! {
        read_result = &mut read_task => {
            write_task.abort();
            finish_on_ack(read_result)
        }
        write_result = &mut write_task => {
            match write_result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    read_task.abort();
                    return Err(e);
                }
                Err(e) => {
                    read_task.abort();
                    return Err(ClientError::Transport(e.to_string()));
                }
            }
            // Disconnect sent; block until the relay acknowledges it.
            finish_on_ack(read_task.await)
        }
    }
}

fn finish_on_ack(
    read_result: Result<Result<SessionEnd, ClientError>, tokio::task::JoinError>,
) -> Result<(), ClientError> {
    match read_result {
        Ok(Ok(SessionEnd::Acknowledged)) => {
            tracing::info!("relay acknowledged the disconnect");
            Ok(())
        }
        Ok(Err(e)) => Err(e),
        Err(e) => Err(ClientError::Transport(e.to_string())),
    }
}

async fn send_frame<S>(sink: &mut S, message: &Message) -> Result<(), ClientError>
where
    S: futures_util::Sink<WsMessage> + Unpin,
    <S as futures_util::Sink<WsMessage>>::Error: std::fmt::Display,
{
    let json =
        serde_json::to_string(message).map_err(|e| ClientError::Transport(e.to_string()))?;
    sink.send(WsMessage::Text(json.into()))
        .await
        .map_err(|e| ClientError::Transport(e.to_string()))
}
