//! Message dispatcher setup.
//!
//! Builds the dispatcher with all command handlers and event handlers.
//! teloxide's default distribution runs updates of one chat in order and
//! different chats concurrently.

use std::sync::Arc;

use teloxide::adaptors::Throttle;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;

use crate::config::Config;
use crate::database::SettingsStore;
use crate::events;
use crate::gateway::{ChatGateway, TelegramGateway};
use crate::membership::MembershipOracle;
use crate::moderation::ModerationPipeline;
use crate::permissions::Permissions;
use crate::plugins;
use crate::scheduler::DelayedTaskScheduler;
use crate::wizard::AdminWizard;

/// Bot type with Throttle adaptor for automatic rate limiting.
pub type ThrottledBot = Throttle<Bot>;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SettingsStore>,

    pub gateway: Arc<dyn ChatGateway>,

    /// Admin checks with caching; also knows the bot owners.
    pub permissions: Permissions,

    pub wizard: AdminWizard,

    pub pipeline: ModerationPipeline,

    /// Language of every user-facing text.
    pub locale: String,
}

impl AppState {
    pub fn new(bot: ThrottledBot, store: Arc<dyn SettingsStore>, config: &Config) -> Self {
        let gateway: Arc<dyn ChatGateway> = Arc::new(TelegramGateway::new(bot));
        let permissions = Permissions::with_owners(gateway.clone(), config.owner_ids.clone());
        let wizard = AdminWizard::new(store.clone(), gateway.clone());
        let oracle = MembershipOracle::new(store.clone(), gateway.clone(), permissions.clone());
        let pipeline = ModerationPipeline::new(
            wizard.clone(),
            oracle,
            gateway.clone(),
            DelayedTaskScheduler::new(),
            config.warning_ttl,
        );

        Self {
            store,
            gateway,
            permissions,
            wizard,
            pipeline,
            locale: config.lang.clone(),
        }
    }
}

/// Build the dispatcher with all handlers.
pub fn build_dispatcher(
    bot: ThrottledBot,
    store: Arc<dyn SettingsStore>,
    config: &Config,
) -> Dispatcher<ThrottledBot, anyhow::Error, teloxide::dispatching::DefaultKey> {
    let state = AppState::new(bot.clone(), store, config);

    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
}

/// Build the handler schema.
fn schema() -> UpdateHandler<anyhow::Error> {
    use teloxide::dispatching::UpdateFilterExt;

    // Commands first, everything else goes to the moderation events
    let message_handler = Update::filter_message()
        .branch(plugins::command_handler())
        .branch(events::message_event_handler());

    dptree::entry()
        .branch(message_handler)
        .branch(plugins::callback_handler())
}
