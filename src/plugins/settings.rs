//! Group settings panel.
//!
//! `/settings` (or `/start` in a group) shows the panel; its buttons start
//! the wizard, show or remove the current settings.

use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, ParseMode, ReplyParameters};
use tracing::{info, warn};

use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::database::GroupConfig;
use crate::i18n::get_text;
use crate::utils::html_escape;
use crate::wizard::WizardMode;

/// Prefix of every callback this module owns.
pub const CALLBACK_PREFIX: &str = "gate:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelAction {
    AddChannel,
    SetWelcome,
    Remove,
    View,
}

impl PanelAction {
    const ALL: [Self; 4] = [Self::AddChannel, Self::SetWelcome, Self::Remove, Self::View];

    fn name(self) -> &'static str {
        match self {
            Self::AddChannel => "add_channel",
            Self::SetWelcome => "set_welcome",
            Self::Remove => "remove",
            Self::View => "view",
        }
    }

    pub fn callback_data(self) -> String {
        format!("{}{}", CALLBACK_PREFIX, self.name())
    }

    pub fn parse(data: &str) -> Option<Self> {
        let name = data.strip_prefix(CALLBACK_PREFIX)?;
        Self::ALL.into_iter().find(|a| a.name() == name)
    }

    fn label_key(self) -> &'static str {
        match self {
            Self::AddChannel => "settings.button_add_channel",
            Self::SetWelcome => "settings.button_set_welcome",
            Self::Remove => "settings.button_remove",
            Self::View => "settings.button_view",
        }
    }
}

/// One button per row, in panel order.
pub fn settings_keyboard(locale: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(PanelAction::ALL.map(|action| {
        vec![InlineKeyboardButton::callback(
            get_text(locale, action.label_key()),
            action.callback_data(),
        )]
    }))
}

fn fill(template: String, config: &GroupConfig) -> String {
    template
        .replace("{channel}", &html_escape(config.restriction().unwrap_or("-")))
        .replace("{message}", &html_escape(&config.warning_text))
}

/// Panel text for `/settings`.
pub fn current_settings_text(locale: &str, config: Option<&GroupConfig>) -> String {
    match config {
        Some(config) => fill(get_text(locale, "settings.current"), config),
        None => get_text(locale, "settings.none"),
    }
}

/// Panel text for the "view" button.
pub fn view_settings_text(locale: &str, config: Option<&GroupConfig>) -> String {
    match config {
        Some(config) => fill(get_text(locale, "settings.view"), config),
        None => get_text(locale, "settings.view_none"),
    }
}

/// Reply with an error and return false unless the sender may configure this
/// group.
async fn ensure_group_admin(bot: &ThrottledBot, msg: &Message, state: &AppState) -> anyhow::Result<bool> {
    let locale = &state.locale;

    if !msg.chat.is_group() && !msg.chat.is_supergroup() {
        bot.send_message(msg.chat.id, get_text(locale, "common.group_only"))
            .reply_parameters(ReplyParameters::new(msg.id))
            .await?;
        return Ok(false);
    }

    let Some(user) = msg.from.as_ref() else {
        return Ok(false);
    };

    let key = match state.permissions.can_configure(msg.chat.id, user.id).await {
        Ok(true) => return Ok(true),
        Ok(false) => "common.admin_only",
        Err(e) => {
            warn!("Admin check for {} in {} failed: {}", user.id, msg.chat.id, e);
            "common.error"
        }
    };

    bot.send_message(msg.chat.id, get_text(locale, key))
        .reply_parameters(ReplyParameters::new(msg.id))
        .await?;
    Ok(false)
}

/// Handle /settings.
pub async fn settings_command(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
    if !ensure_group_admin(&bot, &msg, &state).await? {
        return Ok(());
    }

    let config = state.store.get(msg.chat.id.0).await?;
    bot.send_message(
        msg.chat.id,
        current_settings_text(&state.locale, config.as_ref()),
    )
    .parse_mode(ParseMode::Html)
    .reply_markup(settings_keyboard(&state.locale))
    .await?;

    Ok(())
}

/// Handle /cancel.
pub async fn cancel_command(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
    if !ensure_group_admin(&bot, &msg, &state).await? {
        return Ok(());
    }

    let key = match state.wizard.cancel(msg.chat.id) {
        Some(_) => "wizard.cancelled",
        None => "wizard.nothing_to_cancel",
    };
    bot.send_message(msg.chat.id, get_text(&state.locale, key))
        .reply_parameters(ReplyParameters::new(msg.id))
        .await?;

    Ok(())
}

/// Handle a settings panel button.
pub async fn settings_callback(bot: ThrottledBot, q: CallbackQuery, state: AppState) -> anyhow::Result<()> {
    let locale = &state.locale;

    let action = q.data.as_deref().and_then(PanelAction::parse);
    let (Some(action), Some(panel)) = (action, q.message.as_ref()) else {
        bot.answer_callback_query(&q.id).await?;
        return Ok(());
    };

    let chat_id = panel.chat().id;
    let allowed = state
        .permissions
        .can_configure(chat_id, q.from.id)
        .await
        .unwrap_or_else(|e| {
            warn!("Admin check for {} in {} failed: {}", q.from.id, chat_id, e);
            false
        });

    if !allowed {
        // A user promoted a moment ago can press again
        state.permissions.invalidate(chat_id, q.from.id);
        bot.answer_callback_query(&q.id)
            .text(get_text(locale, "common.admin_only"))
            .show_alert(true)
            .await?;
        return Ok(());
    }

    let edit = match action {
        PanelAction::AddChannel | PanelAction::SetWelcome => {
            let (mode, prompt) = if action == PanelAction::AddChannel {
                (WizardMode::AwaitingChannel, "wizard.prompt_channel")
            } else {
                (WizardMode::AwaitingWelcomeText, "wizard.prompt_welcome")
            };
            state.wizard.begin(chat_id, q.from.id, mode, Some(panel.id()));
            bot.edit_message_text(chat_id, panel.id(), get_text(locale, prompt))
                .await
        }
        PanelAction::Remove => match state.store.delete(chat_id.0).await {
            Ok(existed) => {
                info!("Settings of {} removed by {} (existed: {})", chat_id, q.from.id, existed);
                bot.edit_message_text(chat_id, panel.id(), get_text(locale, "settings.removed"))
                    .await
            }
            Err(e) => {
                warn!("Failed to remove settings of {}: {}", chat_id, e);
                bot.answer_callback_query(&q.id)
                    .text(get_text(locale, "common.error"))
                    .show_alert(true)
                    .await?;
                return Ok(());
            }
        },
        PanelAction::View => {
            let config = state.store.get(chat_id.0).await?;
            bot.edit_message_text(
                chat_id,
                panel.id(),
                view_settings_text(locale, config.as_ref()),
            )
            .parse_mode(ParseMode::Html)
            .reply_markup(settings_keyboard(locale))
            .await
        }
    };

    // Pressing "view" twice leaves the text unchanged, which Telegram refuses
    if let Err(e) = edit {
        warn!("Failed to update settings panel in {}: {}", chat_id, e);
    }

    bot.answer_callback_query(&q.id).await?;
    Ok(())
}
