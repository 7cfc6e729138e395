//! Event handlers for ordinary (non-command) messages.
//!
//! Group text goes through the moderation pipeline; private text gets a short
//! hint on how to use the bot.

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::{ParseMode, ReplyParameters};
use tracing::debug;

use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::error::{GateError, GateResult};
use crate::i18n::get_text;
use crate::moderation::{InboundMessage, ModerationOutcome};
use crate::utils::html_escape;
use crate::wizard::WizardOutcome;

/// Build the message event handler.
pub fn message_event_handler() -> UpdateHandler<anyhow::Error> {
    dptree::filter(|msg: Message| {
        msg.text().is_some_and(|t| !t.starts_with('/'))
            && msg.from.as_ref().is_some_and(|u| !u.is_bot)
    })
    .branch(dptree::filter(|msg: Message| msg.chat.is_private()).endpoint(private_hint))
    .branch(
        dptree::filter(|msg: Message| msg.chat.is_group() || msg.chat.is_supergroup())
            .endpoint(moderate),
    )
}

async fn private_hint(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
    bot.send_message(msg.chat.id, get_text(&state.locale, "common.private_hint"))
        .await?;
    Ok(())
}

async fn moderate(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
    let Some(inbound) = InboundMessage::from_message(&msg) else {
        return Ok(());
    };

    match state.pipeline.handle(&inbound).await {
        ModerationOutcome::WizardAnswer(result) => {
            bot.send_message(msg.chat.id, render_answer(&state.locale, &result))
                .parse_mode(ParseMode::Html)
                .reply_parameters(ReplyParameters::new(msg.id))
                .await?;
        }
        ModerationOutcome::Rejected(enforcement) => debug!(
            "Message {} in {} rejected: deleted={}, warning={:?}, cleanup scheduled={}",
            msg.id.0,
            msg.chat.id,
            enforcement.deleted,
            enforcement.warning.map(|id| id.0),
            enforcement.cleanup.is_some()
        ),
        ModerationOutcome::Admitted(reason) => {
            debug!("Message {} in {} admitted: {:?}", msg.id.0, msg.chat.id, reason)
        }
        ModerationOutcome::Ignored => {}
    }

    Ok(())
}

/// Reply shown to the admin after answering a wizard question.
pub fn render_answer(locale: &str, result: &GateResult<WizardOutcome>) -> String {
    match result {
        Ok(WizardOutcome::ChannelSaved(config)) => get_text(locale, "wizard.channel_saved")
            .replace("{channel}", &html_escape(config.restriction().unwrap_or_default())),
        Ok(WizardOutcome::WarningTextSaved(_)) => get_text(locale, "wizard.text_saved"),
        Err(GateError::ConfigurationRejected(rejection)) => {
            get_text(locale, rejection.text_key())
        }
        Err(GateError::Storage(_)) => get_text(locale, "wizard.error_storage"),
        Err(_) => get_text(locale, "common.error"),
    }
}
