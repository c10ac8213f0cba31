pub mod telegram;

use async_trait::async_trait;
use teloxide::types::{ChatId, MessageId, UserId};

use crate::router::Action;

/// The parts of an inbound message the router looks at.
/// Lives only for the duration of one dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingMessage {
    pub chat_id: ChatId,
    /// One-to-one chat with the bot
    pub is_private: bool,
    /// Sender identifier, falls back to the chat when the sender is unknown
    pub sender_id: ChatId,
    pub message_id: MessageId,
    pub text: Option<String>,
    /// File ids of every delivered photo size, in delivery order
    pub photos: Vec<String>,
    pub document: Option<String>,
    pub sticker: Option<String>,
    pub reply_to: Option<RepliedMessage>,
}

/// The message a group member replied to
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RepliedMessage {
    /// Original author when the replied message was forwarded from a user
    pub forward_origin: Option<UserId>,
}

/// Outbound side of the platform. One `deliver` call is one Bot API request.
#[async_trait]
pub trait Outbox: Send + Sync {
    type Error: std::fmt::Display + Send;

    async fn deliver(&self, action: &Action) -> Result<(), Self::Error>;
}
