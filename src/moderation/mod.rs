//! Moderation pipeline.
//!
//! Runs once per plain-text group message:
//!
//! 1. a pending wizard question from the sender consumes the message
//! 2. admitted senders are left alone, including every sender in a group
//!    without settings
//! 3. otherwise the message is deleted, a warning is sent and the warning is
//!    scheduled for removal
//!
//! Every step in 3 is best-effort and attempted in that order, so a failed
//! delete still produces a warning.

use std::sync::Arc;
use std::time::Duration;

use teloxide::types::{ChatId, Message, MessageId, UserId};
use tracing::{debug, info, warn};

use crate::database::GroupConfig;
use crate::error::GateResult;
use crate::gateway::ChatGateway;
use crate::membership::{AdmitReason, MembershipOracle, Verdict};
use crate::scheduler::{DelayedTaskScheduler, PendingCleanup, TaskHandle};
use crate::utils::{html_escape, mention_html};
use crate::wizard::{AdminWizard, WizardOutcome};

/// The parts of an inbound message the pipeline looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub sender_id: UserId,
    pub sender_name: String,
    pub sender_is_bot: bool,
    pub text: String,
}

impl InboundMessage {
    /// Extract a plain-text message with a known sender.
    pub fn from_message(msg: &Message) -> Option<Self> {
        let user = msg.from.as_ref()?;
        let text = msg.text()?;
        Some(Self {
            chat_id: msg.chat.id,
            message_id: msg.id,
            sender_id: user.id,
            sender_name: user.first_name.clone(),
            sender_is_bot: user.is_bot,
            text: text.to_string(),
        })
    }
}

#[derive(Debug)]
pub enum ModerationOutcome {
    /// Bot senders are never moderated.
    Ignored,
    /// The message answered a pending wizard question.
    WizardAnswer(GateResult<WizardOutcome>),
    Admitted(AdmitReason),
    Rejected(Enforcement),
}

/// What happened to a rejected message.
#[derive(Debug)]
pub struct Enforcement {
    pub deleted: bool,
    pub warning: Option<MessageId>,
    pub cleanup: Option<TaskHandle>,
}

#[derive(Clone)]
pub struct ModerationPipeline {
    wizard: AdminWizard,
    oracle: MembershipOracle,
    gateway: Arc<dyn ChatGateway>,
    scheduler: DelayedTaskScheduler,
    warning_ttl: Duration,
}

impl ModerationPipeline {
    pub fn new(
        wizard: AdminWizard,
        oracle: MembershipOracle,
        gateway: Arc<dyn ChatGateway>,
        scheduler: DelayedTaskScheduler,
        warning_ttl: Duration,
    ) -> Self {
        Self {
            wizard,
            oracle,
            gateway,
            scheduler,
            warning_ttl,
        }
    }

    pub async fn handle(&self, msg: &InboundMessage) -> ModerationOutcome {
        if msg.sender_is_bot {
            return ModerationOutcome::Ignored;
        }

        if let Some(result) = self.wizard.answer(msg.chat_id, msg.sender_id, &msg.text).await {
            return ModerationOutcome::WizardAnswer(result);
        }

        match self.oracle.is_admitted(msg.chat_id, msg.sender_id).await {
            Verdict::Admitted(reason) => ModerationOutcome::Admitted(reason),
            Verdict::Rejected(refusal) => {
                info!(
                    "Removing message {} from {} in {} (channel status {:?})",
                    msg.message_id.0, msg.sender_id, msg.chat_id, refusal.status
                );
                ModerationOutcome::Rejected(self.enforce(msg, &refusal.config).await)
            }
        }
    }

    async fn enforce(&self, msg: &InboundMessage, config: &GroupConfig) -> Enforcement {
        let deleted = match self.gateway.delete_message(msg.chat_id, msg.message_id).await {
            Ok(outcome) => {
                debug!("Delete of {} in {}: {:?}", msg.message_id.0, msg.chat_id, outcome);
                true
            }
            Err(e) => {
                warn!(
                    "Failed to delete message {} in {}: {}",
                    msg.message_id.0, msg.chat_id, e
                );
                false
            }
        };

        // Not a reply: the original is most likely gone already
        let text = warning_text(msg.sender_id, &msg.sender_name, &config.warning_text);
        let warning = match self.gateway.send_message(msg.chat_id, &text).await {
            Ok(id) => Some(id),
            Err(e) => {
                warn!("Failed to send warning in {}: {}", msg.chat_id, e);
                None
            }
        };

        let cleanup = warning.map(|id| {
            self.scheduler.schedule_cleanup(
                self.gateway.clone(),
                PendingCleanup {
                    target_chat: msg.chat_id,
                    target_message: id,
                    fire_after: self.warning_ttl,
                },
            )
        });

        Enforcement {
            deleted,
            warning,
            cleanup,
        }
    }
}

/// Warning addressed to the sender. The configured text is shown literally.
pub fn warning_text(user_id: UserId, first_name: &str, template: &str) -> String {
    format!(
        "👋 {}\n{}",
        mention_html(user_id.0, first_name),
        html_escape(template)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::SettingsStore;
    use crate::database::MemorySettingsStore;
    use crate::error::{GateError, Rejection};
    use crate::gateway::mock::{Call, MockGateway};
    use crate::gateway::{EntityKind, MemberStatus};
    use crate::permissions::Permissions;
    use crate::wizard::WizardMode;

    const CHAT: ChatId = ChatId(-1003);
    const TTL: Duration = Duration::from_secs(10);

    struct Fixture {
        store: Arc<MemorySettingsStore>,
        gateway: Arc<MockGateway>,
        wizard: AdminWizard,
        pipeline: ModerationPipeline,
    }

    fn fixture(gateway: MockGateway) -> Fixture {
        let store = Arc::new(MemorySettingsStore::new());
        let gateway = Arc::new(gateway);
        let permissions = Permissions::with_owners(gateway.clone(), Vec::new());
        let oracle = MembershipOracle::new(store.clone(), gateway.clone(), permissions);
        let wizard = AdminWizard::new(store.clone(), gateway.clone());
        let pipeline = ModerationPipeline::new(
            wizard.clone(),
            oracle,
            gateway.clone(),
            DelayedTaskScheduler::new(),
            TTL,
        );
        Fixture {
            store,
            gateway,
            wizard,
            pipeline,
        }
    }

    fn message(sender: u64, text: &str) -> InboundMessage {
        InboundMessage {
            chat_id: CHAT,
            message_id: MessageId(5),
            sender_id: UserId(sender),
            sender_name: "Ann".to_string(),
            sender_is_bot: false,
            text: text.to_string(),
        }
    }

    async fn restrict(f: &Fixture) {
        f.store
            .put(CHAT.0, Some("@x".into()), Some("Join @x first".into()))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn unconfigured_group_is_not_moderated() {
        let f = fixture(MockGateway::new());

        let outcome = f.pipeline.handle(&message(1, "hello")).await;

        assert!(matches!(
            outcome,
            ModerationOutcome::Admitted(AdmitReason::NoRestriction)
        ));
        assert!(f.gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn subscribers_are_left_alone() {
        let f = fixture(MockGateway::new().with_status("@x", 1, MemberStatus::Member));
        restrict(&f).await;

        let outcome = f.pipeline.handle(&message(1, "hello")).await;

        assert!(matches!(
            outcome,
            ModerationOutcome::Admitted(AdmitReason::Subscribed)
        ));
        assert!(f.gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn bots_are_ignored() {
        let f = fixture(MockGateway::new());
        restrict(&f).await;
        let mut msg = message(1, "beep");
        msg.sender_is_bot = true;

        assert!(matches!(f.pipeline.handle(&msg).await, ModerationOutcome::Ignored));
        assert!(f.gateway.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_message_is_deleted_warned_and_cleaned() {
        let f = fixture(MockGateway::new());
        restrict(&f).await;

        let outcome = f.pipeline.handle(&message(1, "hello")).await;

        let ModerationOutcome::Rejected(enforcement) = outcome else {
            panic!("expected rejection, got {outcome:?}");
        };
        assert!(enforcement.deleted);
        let warning = enforcement.warning.expect("warning sent");

        let calls = f.gateway.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], Call::Delete(CHAT, MessageId(5)));
        assert_eq!(
            calls[1],
            Call::Send(CHAT, warning_text(UserId(1), "Ann", "Join @x first"))
        );

        enforcement.cleanup.expect("cleanup scheduled").join().await;
        let calls = f.gateway.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[2], Call::Delete(CHAT, warning));
    }

    #[tokio::test(start_paused = true)]
    async fn warning_waits_for_the_configured_delay() {
        let f = fixture(MockGateway::new());
        restrict(&f).await;

        let outcome = f.pipeline.handle(&message(1, "hello")).await;
        let ModerationOutcome::Rejected(enforcement) = outcome else {
            panic!("expected rejection");
        };

        tokio::time::sleep(TTL - Duration::from_secs(1)).await;
        assert_eq!(f.gateway.calls().len(), 2);

        enforcement.cleanup.unwrap().join().await;
        assert_eq!(f.gateway.calls().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_delete_still_warns_and_schedules() {
        let f = fixture(MockGateway::new().failing_deletes());
        restrict(&f).await;

        let outcome = f.pipeline.handle(&message(1, "hello")).await;

        let ModerationOutcome::Rejected(enforcement) = outcome else {
            panic!("expected rejection");
        };
        assert!(!enforcement.deleted);
        assert!(enforcement.warning.is_some());
        assert!(enforcement.cleanup.is_some());
        assert_eq!(f.gateway.sent_texts().len(), 1);
    }

    #[tokio::test]
    async fn failed_send_skips_cleanup() {
        let f = fixture(MockGateway::new().failing_sends());
        restrict(&f).await;

        let outcome = f.pipeline.handle(&message(1, "hello")).await;

        let ModerationOutcome::Rejected(enforcement) = outcome else {
            panic!("expected rejection");
        };
        assert!(enforcement.deleted);
        assert!(enforcement.warning.is_none());
        assert!(enforcement.cleanup.is_none());
    }

    #[tokio::test]
    async fn group_admins_are_never_moderated() {
        let f = fixture(MockGateway::new().with_admin(CHAT.0, 2));
        restrict(&f).await;

        let outcome = f.pipeline.handle(&message(2, "hello")).await;

        assert!(matches!(
            outcome,
            ModerationOutcome::Admitted(AdmitReason::GroupAdmin)
        ));
    }

    #[tokio::test]
    async fn promoted_admin_is_no_longer_moderated() {
        let f = fixture(MockGateway::new());
        restrict(&f).await;

        let outcome = f.pipeline.handle(&message(7, "hello")).await;
        assert!(matches!(outcome, ModerationOutcome::Rejected(_)));
        let calls_before = f.gateway.calls().len();

        f.gateway.promote(CHAT.0, 7);
        let outcome = f.pipeline.handle(&message(7, "hello again")).await;

        assert!(matches!(
            outcome,
            ModerationOutcome::Admitted(AdmitReason::GroupAdmin)
        ));
        assert_eq!(f.gateway.calls().len(), calls_before);
    }

    #[tokio::test]
    async fn pending_wizard_answer_is_not_moderated() {
        let f = fixture(MockGateway::new().with_entity("@x", EntityKind::Channel));
        restrict(&f).await;
        f.wizard.begin(CHAT, UserId(3), WizardMode::AwaitingChannel, None);

        // Not an admin and not subscribed, but the message is an answer
        let outcome = f.pipeline.handle(&message(3, "oops")).await;

        assert!(matches!(
            outcome,
            ModerationOutcome::WizardAnswer(Err(GateError::ConfigurationRejected(
                Rejection::MissingMarker
            )))
        ));
        assert!(f.gateway.calls().is_empty());
    }

    #[test]
    fn warning_text_escapes_template() {
        assert_eq!(
            warning_text(UserId(1), "Ann", "<join>"),
            "👋 <a href=\"tg://user?id=1\">Ann</a>\n&lt;join&gt;"
        );
    }
}
