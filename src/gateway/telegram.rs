//! Telegram implementation of [`ChatGateway`] over the throttled teloxide bot.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{Chat, ChatId, ChatMemberKind, MessageId, ParseMode, UserId};
use teloxide::{ApiError, RequestError};
use tracing::debug;

use super::{ChatGateway, DeleteOutcome, EntityKind, MemberStatus};
use crate::bot::dispatcher::ThrottledBot;
use crate::error::{GateError, GateResult};

/// Gateway backed by the Bot API.
#[derive(Clone)]
pub struct TelegramGateway {
    bot: ThrottledBot,
}

impl TelegramGateway {
    pub fn new(bot: ThrottledBot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl ChatGateway for TelegramGateway {
    async fn resolve_entity(&self, handle: &str) -> GateResult<EntityKind> {
        match self.bot.get_chat(handle.to_string()).await {
            Ok(chat) => Ok(entity_kind(&chat)),
            Err(RequestError::Api(ApiError::ChatNotFound)) => Ok(EntityKind::Unknown),
            Err(e) => Err(GateError::LookupFailure(e.to_string())),
        }
    }

    async fn get_membership_status(
        &self,
        channel: &str,
        user_id: UserId,
    ) -> GateResult<MemberStatus> {
        match self.bot.get_chat_member(channel.to_string(), user_id).await {
            Ok(member) => Ok(member_status(&member.kind)),
            Err(e) if is_user_not_found(&e) => Ok(MemberStatus::NotFound),
            Err(e) => {
                debug!("Membership lookup for {} in {} failed: {}", user_id, channel, e);
                Err(GateError::LookupFailure(e.to_string()))
            }
        }
    }

    async fn get_chat_admin_status(&self, chat_id: ChatId, user_id: UserId) -> GateResult<bool> {
        let member = self
            .bot
            .get_chat_member(chat_id, user_id)
            .await
            .map_err(|e| GateError::LookupFailure(e.to_string()))?;

        Ok(member.kind.is_owner() || member.kind.is_administrator())
    }

    async fn send_message(&self, chat_id: ChatId, text: &str) -> GateResult<MessageId> {
        let sent = self
            .bot
            .send_message(chat_id, text)
            .parse_mode(ParseMode::Html)
            .await
            .map_err(|e| GateError::ActionFailure(e.to_string()))?;

        Ok(sent.id)
    }

    async fn delete_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> GateResult<DeleteOutcome> {
        match self.bot.delete_message(chat_id, message_id).await {
            Ok(_) => Ok(DeleteOutcome::Deleted),
            Err(e) if is_message_missing(&e) => Ok(DeleteOutcome::NotFound),
            Err(e) => Err(GateError::ActionFailure(e.to_string())),
        }
    }
}

fn entity_kind(chat: &Chat) -> EntityKind {
    if chat.is_channel() {
        EntityKind::Channel
    } else if chat.is_group() || chat.is_supergroup() {
        EntityKind::Group
    } else if chat.is_private() {
        EntityKind::User
    } else {
        EntityKind::Unknown
    }
}

fn member_status(kind: &ChatMemberKind) -> MemberStatus {
    if kind.is_owner() {
        MemberStatus::Creator
    } else if kind.is_administrator() {
        MemberStatus::Administrator
    } else if kind.is_member() {
        MemberStatus::Member
    } else if kind.is_restricted() {
        MemberStatus::Restricted
    } else if kind.is_banned() {
        MemberStatus::Kicked
    } else {
        MemberStatus::Left
    }
}

fn is_user_not_found(error: &RequestError) -> bool {
    matches!(error, RequestError::Api(ApiError::UserNotFound))
}

fn is_message_missing(error: &RequestError) -> bool {
    matches!(error, RequestError::Api(ApiError::MessageToDeleteNotFound))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_not_found_maps_to_resolvable_status() {
        assert!(is_user_not_found(&RequestError::Api(ApiError::UserNotFound)));
        assert!(!is_user_not_found(&RequestError::Api(ApiError::ChatNotFound)));
        assert!(!is_user_not_found(&RequestError::Api(ApiError::BotBlocked)));
    }

    #[test]
    fn missing_message_is_detected() {
        assert!(is_message_missing(&RequestError::Api(
            ApiError::MessageToDeleteNotFound
        )));
        assert!(!is_message_missing(&RequestError::Api(
            ApiError::MessageCantBeDeleted
        )));
    }
}
