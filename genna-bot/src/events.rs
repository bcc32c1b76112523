//! Message events flowing through the bus between channels and the
//! dialog service.

use genna::util::generate_message_id;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// An inbound message from a channel to the dialog service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Unique message ID.
    pub id: String,
    /// Channel identifier (e.g., "cli", "web").
    pub channel: String,
    /// Sender's identifier within the channel.
    pub sender_id: String,
    /// Chat/conversation identifier.
    pub chat_id: String,
    /// Message text content.
    pub content: String,
    /// Sender's display name, when the channel provides one.
    pub sender_name: Option<String>,
    /// Timestamp when the message was received.
    pub timestamp: SystemTime,
}

impl InboundMessage {
    /// Create a new inbound message.
    pub fn new(
        channel: impl Into<String>,
        sender_id: impl Into<String>,
        chat_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: generate_message_id(),
            channel: channel.into(),
            sender_id: sender_id.into(),
            chat_id: chat_id.into(),
            content: content.into(),
            sender_name: None,
            timestamp: SystemTime::now(),
        }
    }

    /// Create a CLI message.
    pub fn cli(content: impl Into<String>) -> Self {
        Self::new("cli", "user", "direct", content)
    }

    /// Set the sender's display name.
    #[must_use]
    pub fn with_sender_name(mut self, name: impl Into<String>) -> Self {
        self.sender_name = Some(name.into());
        self
    }

    /// Get the conversation key for this message, the unit of dialog
    /// state isolation.
    #[must_use]
    pub fn conversation_key(&self) -> String {
        format!("{}:{}", self.channel, self.chat_id)
    }
}

/// An outbound message from the dialog service to a channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// Unique message ID.
    pub id: String,
    /// Target channel identifier.
    pub channel: String,
    /// Target chat/conversation identifier.
    pub chat_id: String,
    /// Message text content.
    pub content: String,
    /// Optional message ID this responds to.
    pub reply_to: Option<String>,
}

impl OutboundMessage {
    /// Create a new outbound message.
    pub fn new(
        channel: impl Into<String>,
        chat_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: generate_message_id(),
            channel: channel.into(),
            chat_id: chat_id.into(),
            content: content.into(),
            reply_to: None,
        }
    }

    /// Create a response to an inbound message.
    pub fn reply_to(msg: &InboundMessage, content: impl Into<String>) -> Self {
        Self {
            id: generate_message_id(),
            channel: msg.channel.clone(),
            chat_id: msg.chat_id.clone(),
            content: content.into(),
            reply_to: Some(msg.id.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversation_key() {
        let msg = InboundMessage::new("cli", "user-1", "direct", "Hello");
        assert_eq!(msg.conversation_key(), "cli:direct");
    }

    #[test]
    fn test_reply_targets_source_chat() {
        let inbound = InboundMessage::new("web", "claimant-9", "room-4", "Hi");
        let outbound = OutboundMessage::reply_to(&inbound, "Hello back!");

        assert_eq!(outbound.channel, "web");
        assert_eq!(outbound.chat_id, "room-4");
        assert_eq!(outbound.reply_to, Some(inbound.id));
    }

    #[test]
    fn test_message_ids_unique() {
        let a = InboundMessage::cli("one");
        let b = InboundMessage::cli("two");
        assert_ne!(a.id, b.id);
    }
}
