//! /start and /myid.

use teloxide::prelude::*;
use teloxide::types::ReplyParameters;
use tracing::warn;

use super::settings::settings_keyboard;
use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::i18n::get_text;

/// In private: an introduction (owners get their command list).
/// In a group: the settings panel for admins.
pub async fn start_command(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    let locale = &state.locale;

    if msg.chat.is_private() {
        let key = if state.permissions.is_bot_owner(user.id) {
            "start.owner"
        } else {
            "start.user"
        };
        bot.send_message(msg.chat.id, get_text(locale, key)).await?;
        return Ok(());
    }

    let reply = match state.permissions.can_configure(msg.chat.id, user.id).await {
        Ok(true) => bot
            .send_message(msg.chat.id, get_text(locale, "settings.panel"))
            .reply_markup(settings_keyboard(locale)),
        Ok(false) => bot.send_message(msg.chat.id, get_text(locale, "common.admin_only")),
        Err(e) => {
            warn!("Admin check for {} in {} failed: {}", user.id, msg.chat.id, e);
            bot.send_message(msg.chat.id, get_text(locale, "common.error"))
        }
    };

    reply.reply_parameters(ReplyParameters::new(msg.id)).await?;
    Ok(())
}

pub async fn myid_command(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };

    bot.send_message(
        msg.chat.id,
        get_text(&state.locale, "myid.text").replace("{id}", &user.id.to_string()),
    )
    .reply_parameters(ReplyParameters::new(msg.id))
    .await?;
    Ok(())
}
