//! Message formatting utilities for client display.

use relaybus_shared::message::{Message, MessageKind};

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Render an inbound protocol message for display.
    ///
    /// Acks never reach the formatter; they terminate the receive loop
    /// before rendering.
    ///
    /// # Arguments
    ///
    /// * `message` - The broadcast received from the relay
    /// * `local_time` - The client's own Lamport time after observing it
    pub fn format_message(message: &Message, local_time: u64) -> String {
        let from = message
            .sender
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "unknown".to_string());

        match message.kind {
            MessageKind::Connect => Self::format_join(&from, message.logical_time, local_time),
            MessageKind::Disconnect => {
                Self::format_departure(&from, message.logical_time, local_time)
            }
            _ => Self::format_publish(&from, &message.text, message.logical_time, local_time),
        }
    }

    /// Format a published message from another participant
    pub fn format_publish(from: &str, text: &str, relay_time: u64, local_time: u64) -> String {
        format!(
            "\n@{}: {}\n(relay time {}, local time {})\n",
            from, text, relay_time, local_time
        )
    }

    /// Format a join notice
    pub fn format_join(reference: &str, relay_time: u64, local_time: u64) -> String {
        format!(
            "\n+ {} joined the relay (relay time {}, local time {})\n",
            reference, relay_time, local_time
        )
    }

    /// Format a departure notice
    pub fn format_departure(reference: &str, relay_time: u64, local_time: u64) -> String {
        format!(
            "\n- {} left the relay (relay time {}, local time {})\n",
            reference, relay_time, local_time
        )
    }

    /// Format a raw frame that did not parse as a protocol message
    pub fn format_raw(text: &str) -> String {
        format!("\n<- received: {}\n", text)
    }
}

#[cfg(test)]
mod tests {
    use relaybus_shared::message::ClientReference;

    use super::*;

    #[test]
    fn test_format_publish_shows_both_times() {
        // given:
        let result = MessageFormatter::format_publish("127.0.0.1:6001", "hi", 7, 8);

        // then:
        assert!(result.contains("@127.0.0.1:6001: hi"));
        assert!(result.contains("relay time 7"));
        assert!(result.contains("local time 8"));
    }

    #[test]
    fn test_format_join() {
        let result = MessageFormatter::format_join("127.0.0.1:6002", 3, 4);

        assert!(result.contains("+ 127.0.0.1:6002 joined the relay"));
        assert!(result.contains("relay time 3"));
    }

    #[test]
    fn test_format_departure() {
        let result = MessageFormatter::format_departure("127.0.0.1:6002", 9, 10);

        assert!(result.contains("- 127.0.0.1:6002 left the relay"));
        assert!(result.contains("local time 10"));
    }

    #[test]
    fn test_format_message_dispatches_on_kind() {
        // given:
        let sender = ClientReference::new("127.0.0.1", 6001);
        let publish = Message::publish("hi", sender.clone()).stamped(5);
        let join = Message::join_notice(sender.clone()).stamped(6);
        let departure = Message::departure_notice(sender).stamped(7);

        // then:
        assert!(MessageFormatter::format_message(&publish, 9).contains("@127.0.0.1:6001: hi"));
        assert!(MessageFormatter::format_message(&join, 9).contains("joined the relay"));
        assert!(MessageFormatter::format_message(&departure, 9).contains("left the relay"));
    }

    #[test]
    fn test_format_raw_message() {
        let result = MessageFormatter::format_raw("not json");

        assert!(result.contains("not json"));
        assert!(result.contains("received:"));
    }
}
