//! Chat transport port.
//!
//! The gate core never talks to Telegram directly. It consumes the five
//! operations below, implemented by [`TelegramGateway`] in production and by a
//! recording mock in tests.

#[cfg(test)]
pub mod mock;
mod telegram;

use async_trait::async_trait;
use teloxide::types::{ChatId, MessageId, UserId};

use crate::error::GateResult;

pub use telegram::TelegramGateway;

/// What a public handle resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Channel,
    Group,
    User,
    Unknown,
}

/// Coarse membership status of a user in a chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberStatus {
    Creator,
    Administrator,
    Member,
    Restricted,
    Left,
    Kicked,
    NotFound,
}

impl MemberStatus {
    /// Statuses that count as "subscribed" to a channel.
    pub fn is_subscribed(self) -> bool {
        matches!(self, Self::Creator | Self::Administrator | Self::Member)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
}

#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Resolve a public `@handle` to its entity kind.
    async fn resolve_entity(&self, handle: &str) -> GateResult<EntityKind>;

    /// Membership status of `user_id` in the channel `channel`.
    async fn get_membership_status(
        &self,
        channel: &str,
        user_id: UserId,
    ) -> GateResult<MemberStatus>;

    /// Whether `user_id` is an administrator or the creator of `chat_id`.
    async fn get_chat_admin_status(&self, chat_id: ChatId, user_id: UserId) -> GateResult<bool>;

    /// Send an HTML-formatted message, returning its id.
    async fn send_message(&self, chat_id: ChatId, text: &str) -> GateResult<MessageId>;

    /// Delete a message. A message that is already gone is not an error.
    async fn delete_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> GateResult<DeleteOutcome>;
}
