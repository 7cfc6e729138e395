//! Settings wizard.
//!
//! An admin presses a settings button, the bot asks a question, and the
//! admin's next free-text message in that chat is the answer. There is one
//! outstanding question per chat: pressing another button replaces it, and a
//! second admin pressing a button takes the question over (last writer wins).
//! Any answer, accepted or rejected, returns the chat to idle.

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use teloxide::types::{ChatId, MessageId, UserId};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::database::{GroupConfig, SettingsStore};
use crate::error::{GateError, GateResult, Rejection};
use crate::gateway::{ChatGateway, EntityKind};
use crate::utils::is_channel_handle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardMode {
    Idle,
    AwaitingChannel,
    AwaitingWelcomeText,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardState {
    pub mode: WizardMode,
    /// Admin whose next message is the answer.
    pub admin_id: Option<UserId>,
    /// Settings panel to remove once the answer is accepted.
    pub anchor_message_id: Option<MessageId>,
}

impl WizardState {
    #[cfg(test)]
    fn idle() -> Self {
        Self {
            mode: WizardMode::Idle,
            admin_id: None,
            anchor_message_id: None,
        }
    }
}

/// Result of an accepted answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardOutcome {
    ChannelSaved(GroupConfig),
    WarningTextSaved(GroupConfig),
}

#[derive(Clone)]
pub struct AdminWizard {
    /// Non-idle chats only.
    sessions: Arc<DashMap<i64, WizardState>>,
    /// Serializes the read-modify-write of a group's row.
    group_locks: Arc<DashMap<i64, Arc<Mutex<()>>>>,
    store: Arc<dyn SettingsStore>,
    gateway: Arc<dyn ChatGateway>,
}

impl AdminWizard {
    pub fn new(store: Arc<dyn SettingsStore>, gateway: Arc<dyn ChatGateway>) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            group_locks: Arc::new(DashMap::new()),
            store,
            gateway,
        }
    }

    /// Ask `admin_id` a question, replacing whatever was pending in the chat.
    /// Returns the replaced state, if any.
    pub fn begin(
        &self,
        chat_id: ChatId,
        admin_id: UserId,
        mode: WizardMode,
        anchor_message_id: Option<MessageId>,
    ) -> Option<WizardState> {
        if mode == WizardMode::Idle {
            return self.cancel(chat_id);
        }

        let replaced = self.sessions.insert(
            chat_id.0,
            WizardState {
                mode,
                admin_id: Some(admin_id),
                anchor_message_id,
            },
        );

        if let Some(previous) = &replaced {
            debug!(
                "Wizard in chat {} replaced {:?} by {:?} (admin {})",
                chat_id, previous.mode, mode, admin_id
            );
        }
        replaced
    }

    /// Drop any pending question in the chat.
    pub fn cancel(&self, chat_id: ChatId) -> Option<WizardState> {
        self.sessions.remove(&chat_id.0).map(|(_, state)| state)
    }

    #[cfg(test)]
    pub fn state(&self, chat_id: ChatId) -> WizardState {
        self.sessions
            .get(&chat_id.0)
            .map(|s| s.clone())
            .unwrap_or_else(WizardState::idle)
    }

    /// Whether the next message from `user_id` in this chat is a wizard answer.
    #[cfg(test)]
    pub fn is_awaiting(&self, chat_id: ChatId, user_id: UserId) -> bool {
        self.sessions
            .get(&chat_id.0)
            .is_some_and(|s| s.admin_id == Some(user_id))
    }

    /// Consume `text` as the answer to the pending question.
    ///
    /// Returns `None` when `user_id` has nothing pending in this chat, so the
    /// message is left to moderation.
    pub async fn answer(
        &self,
        chat_id: ChatId,
        user_id: UserId,
        text: &str,
    ) -> Option<GateResult<WizardOutcome>> {
        let (_, state) = self
            .sessions
            .remove_if(&chat_id.0, |_, s| s.admin_id == Some(user_id))?;

        let result = match state.mode {
            WizardMode::AwaitingChannel => self.save_channel(chat_id, text).await,
            WizardMode::AwaitingWelcomeText => self.save_warning_text(chat_id, text).await,
            WizardMode::Idle => return None,
        };

        match &result {
            Ok(_) => {
                if let Some(anchor) = state.anchor_message_id {
                    self.remove_anchor(chat_id, anchor).await;
                }
            }
            Err(e) => info!("Wizard answer in chat {} rejected: {}", chat_id, e),
        }

        Some(result)
    }

    async fn save_channel(&self, chat_id: ChatId, text: &str) -> GateResult<WizardOutcome> {
        let handle = text.trim();
        if !is_channel_handle(handle) {
            return Err(GateError::ConfigurationRejected(Rejection::MissingMarker));
        }

        match self.gateway.resolve_entity(handle).await {
            Ok(EntityKind::Channel) => {}
            Ok(kind) => {
                debug!("{} resolved to {:?}, not a channel", handle, kind);
                return Err(GateError::ConfigurationRejected(Rejection::NotAChannel));
            }
            Err(e) => {
                warn!("Could not resolve {}: {}", handle, e);
                return Err(GateError::ConfigurationRejected(
                    Rejection::ChannelUnreachable,
                ));
            }
        }

        self.with_group_lock(chat_id, async {
            // Keep a previously configured warning text
            let previous_text = self.store.get(chat_id.0).await?.map(|c| c.warning_text);
            let config = self
                .store
                .put(chat_id.0, Some(handle.to_string()), previous_text)
                .await?;

            info!("Chat {} now requires {}", chat_id, handle);
            Ok::<_, GateError>(WizardOutcome::ChannelSaved(config))
        })
        .await
    }

    async fn save_warning_text(&self, chat_id: ChatId, text: &str) -> GateResult<WizardOutcome> {
        if text.trim().is_empty() {
            return Err(GateError::ConfigurationRejected(Rejection::EmptyText));
        }

        self.with_group_lock(chat_id, async {
            let channel = self
                .store
                .get(chat_id.0)
                .await?
                .and_then(|c| c.restriction().map(str::to_string))
                .ok_or(GateError::ConfigurationRejected(Rejection::ChannelRequired))?;

            let config = self
                .store
                .put(chat_id.0, Some(channel), Some(text.to_string()))
                .await?;

            info!("Chat {} updated its warning text", chat_id);
            Ok::<_, GateError>(WizardOutcome::WarningTextSaved(config))
        })
        .await
    }

    async fn remove_anchor(&self, chat_id: ChatId, anchor: MessageId) {
        if let Err(e) = self.gateway.delete_message(chat_id, anchor).await {
            debug!("Could not remove settings panel in {}: {}", chat_id, e);
        }
    }

    /// Run `work` holding the group's lock. The lock entry is removed again
    /// once no other answer for the group holds or waits on it.
    async fn with_group_lock<T>(&self, chat_id: ChatId, work: impl Future<Output = T>) -> T {
        let lock = self.group_locks.entry(chat_id.0).or_default().clone();
        let result = {
            let _guard = lock.lock().await;
            work.await
        };

        drop(lock);
        self.group_locks
            .remove_if(&chat_id.0, |_, lock| Arc::strong_count(lock) == 1);
        result
    }
}
