//! Recording gateway for component tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI32, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use teloxide::types::{ChatId, MessageId, UserId};

use super::{ChatGateway, DeleteOutcome, EntityKind, MemberStatus};
use crate::error::{GateError, GateResult};

/// One observed side effect, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Send(ChatId, String),
    Delete(ChatId, MessageId),
}

#[derive(Default)]
pub struct MockGateway {
    entities: Mutex<HashMap<String, EntityKind>>,
    statuses: Mutex<HashMap<(String, u64), MemberStatus>>,
    admins: Mutex<HashMap<(i64, u64), bool>>,
    /// Channels whose membership lookups fail.
    broken_channels: Mutex<Vec<String>>,
    /// Message ids that no longer exist.
    gone: Mutex<Vec<(i64, i32)>>,
    fail_deletes: Mutex<bool>,
    fail_sends: Mutex<bool>,
    fail_admin_lookups: Mutex<bool>,
    calls: Mutex<Vec<Call>>,
    next_id: AtomicI32,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI32::new(1000),
            ..Default::default()
        }
    }

    pub fn with_entity(self, handle: &str, kind: EntityKind) -> Self {
        self.entities.lock().insert(handle.to_string(), kind);
        self
    }

    pub fn with_status(self, channel: &str, user: u64, status: MemberStatus) -> Self {
        self.statuses
            .lock()
            .insert((channel.to_string(), user), status);
        self
    }

    pub fn with_admin(self, chat: i64, user: u64) -> Self {
        self.promote(chat, user);
        self
    }

    /// Make `user` an admin of `chat` after the gateway is in use.
    pub fn promote(&self, chat: i64, user: u64) {
        self.admins.lock().insert((chat, user), true);
    }

    pub fn with_broken_channel(self, channel: &str) -> Self {
        self.broken_channels.lock().push(channel.to_string());
        self
    }

    pub fn failing_deletes(self) -> Self {
        *self.fail_deletes.lock() = true;
        self
    }

    pub fn failing_sends(self) -> Self {
        *self.fail_sends.lock() = true;
        self
    }

    pub fn failing_admin_lookups(self) -> Self {
        *self.fail_admin_lookups.lock() = true;
        self
    }

    /// Mark a message as already removed by someone else.
    pub fn forget_message(&self, chat: ChatId, id: MessageId) {
        self.gone.lock().push((chat.0, id.0));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Send(_, text) => Some(text),
                Call::Delete(..) => None,
            })
            .collect()
    }
}

#[async_trait]
impl ChatGateway for MockGateway {
    async fn resolve_entity(&self, handle: &str) -> GateResult<EntityKind> {
        self.entities
            .lock()
            .get(handle)
            .copied()
            .ok_or_else(|| GateError::LookupFailure(format!("{handle} not found")))
    }

    async fn get_membership_status(
        &self,
        channel: &str,
        user_id: UserId,
    ) -> GateResult<MemberStatus> {
        if self.broken_channels.lock().iter().any(|c| c == channel) {
            return Err(GateError::LookupFailure("channel unreachable".into()));
        }
        Ok(self
            .statuses
            .lock()
            .get(&(channel.to_string(), user_id.0))
            .copied()
            .unwrap_or(MemberStatus::NotFound))
    }

    async fn get_chat_admin_status(&self, chat_id: ChatId, user_id: UserId) -> GateResult<bool> {
        if *self.fail_admin_lookups.lock() {
            return Err(GateError::LookupFailure("admin list unavailable".into()));
        }
        Ok(self
            .admins
            .lock()
            .get(&(chat_id.0, user_id.0))
            .copied()
            .unwrap_or(false))
    }

    async fn send_message(&self, chat_id: ChatId, text: &str) -> GateResult<MessageId> {
        self.calls.lock().push(Call::Send(chat_id, text.to_string()));
        if *self.fail_sends.lock() {
            return Err(GateError::ActionFailure("send refused".into()));
        }
        Ok(MessageId(self.next_id.fetch_add(1, Ordering::SeqCst)))
    }

    async fn delete_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> GateResult<DeleteOutcome> {
        self.calls.lock().push(Call::Delete(chat_id, message_id));
        if *self.fail_deletes.lock() {
            return Err(GateError::ActionFailure("no delete rights".into()));
        }
        let mut gone = self.gone.lock();
        if gone.contains(&(chat_id.0, message_id.0)) {
            return Ok(DeleteOutcome::NotFound);
        }
        gone.push((chat_id.0, message_id.0));
        Ok(DeleteOutcome::Deleted)
    }
}
