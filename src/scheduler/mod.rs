//! Fire-once delayed tasks.
//!
//! Used to remove transient warning messages a few seconds after they were
//! sent. Tasks live on the tokio runtime, never block the caller, and are lost
//! on restart.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use teloxide::types::{ChatId, MessageId};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::gateway::{ChatGateway, DeleteOutcome};

/// Handle to a scheduled task. Dropping it does not cancel the task.
#[derive(Debug)]
pub struct TaskHandle {
    inner: JoinHandle<()>,
}

impl TaskHandle {
    #[allow(dead_code)]
    pub fn is_finished(&self) -> bool {
        self.inner.is_finished()
    }

    /// Wait for the task to run.
    #[cfg(test)]
    pub async fn join(self) {
        let _ = self.inner.await;
    }
}

/// A message to remove once `fire_after` has elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingCleanup {
    pub target_chat: ChatId,
    pub target_message: MessageId,
    pub fire_after: Duration,
}

#[derive(Clone, Default)]
pub struct DelayedTaskScheduler;

impl DelayedTaskScheduler {
    pub fn new() -> Self {
        Self
    }

    /// Run `action` once after `delay`.
    pub fn schedule<F>(&self, delay: Duration, action: F) -> TaskHandle
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let inner = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            action.await;
        });
        TaskHandle { inner }
    }

    /// Schedule deletion of a transient message. A message that is already
    /// gone when the timer fires is ignored.
    pub fn schedule_cleanup(
        &self,
        gateway: Arc<dyn ChatGateway>,
        cleanup: PendingCleanup,
    ) -> TaskHandle {
        let PendingCleanup {
            target_chat,
            target_message,
            fire_after,
        } = cleanup;

        self.schedule(fire_after, async move {
            match gateway.delete_message(target_chat, target_message).await {
                Ok(DeleteOutcome::Deleted) => {
                    debug!("Removed warning {} in chat {}", target_message.0, target_chat);
                }
                Ok(DeleteOutcome::NotFound) => {
                    debug!(
                        "Warning {} in chat {} was already gone",
                        target_message.0, target_chat
                    );
                }
                Err(e) => {
                    warn!(
                        "Failed to remove warning {} in chat {}: {}",
                        target_message.0, target_chat, e
                    );
                }
            }
        })
    }
}
