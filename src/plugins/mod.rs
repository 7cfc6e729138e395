//! Command and callback handlers.

pub mod owner;
pub mod settings;
pub mod start;

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

/// All bot commands.
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Start the bot")]
    Start(String),

    #[command(description = "Show the group settings panel")]
    Settings,

    #[command(description = "Cancel a pending settings question")]
    Cancel,

    #[command(description = "Send a message to every configured group")]
    Broadcast(String),

    #[command(description = "Bot statistics")]
    Stats,

    #[command(description = "Show your user id")]
    Myid,
}

/// Build the combined command handler.
pub fn command_handler() -> UpdateHandler<anyhow::Error> {
    use dptree::case;

    teloxide::filter_command::<Command, _>()
        .branch(case![Command::Start(args)].endpoint(start::start_command))
        .branch(case![Command::Settings].endpoint(settings::settings_command))
        .branch(case![Command::Cancel].endpoint(settings::cancel_command))
        .branch(case![Command::Broadcast(text)].endpoint(owner::broadcast_command))
        .branch(case![Command::Stats].endpoint(owner::stats_command))
        .branch(case![Command::Myid].endpoint(start::myid_command))
}

/// Build the callback query handler.
pub fn callback_handler() -> UpdateHandler<anyhow::Error> {
    Update::filter_callback_query().branch(
        dptree::filter(|q: CallbackQuery| {
            q.data
                .as_ref()
                .is_some_and(|d| d.starts_with(settings::CALLBACK_PREFIX))
        })
        .endpoint(settings::settings_callback),
    )
}
