//! channel-gate - Telegram channel membership gate.
//!
//! Members of a group may only post while they are subscribed to the channel
//! the group's admins picked. Other messages are deleted and replaced by a
//! short-lived warning.
//!
//! ## Architecture
//!
//! - `config` - Environment configuration
//! - `database` - Settings store (MongoDB or in-memory)
//! - `gateway` - Telegram Bot API port
//! - `permissions` - Admin checking with caching
//! - `membership` - Who may post
//! - `wizard` - Admin settings conversation
//! - `moderation` - Per-message pipeline
//! - `scheduler` - Delayed warning cleanup
//! - `bot` - Dispatcher and runtime (with Throttle for API rate limiting)
//! - `plugins` - Command and button handlers
//! - `events` - Ordinary message handlers

mod bot;
mod cache;
mod config;
mod database;
mod error;
mod events;
mod gateway;
mod i18n;
mod membership;
mod moderation;
mod permissions;
mod plugins;
mod scheduler;
mod utils;
mod wizard;

use teloxide::adaptors::throttle::Limits;
use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::Config;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // RUST_LOG overrides the default filter
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("channel_gate=info,teloxide=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting channel-gate...");

    i18n::init();

    let config = Config::from_env()?;
    i18n::set_locale(&config.lang);
    info!("Bot mode: {:?}, language: {}", config.bot_mode, config.lang);

    let store = database::open_store(config.mongodb_uri.as_deref(), &config.mongodb_database).await?;
    info!("Settings store ready");

    // Throttle keeps us inside Telegram's per-chat and global rate limits
    let bot = Bot::new(&config.bot_token).throttle(Limits::default());

    let me = bot.get_me().await?;
    info!("Bot username: @{}", me.username());

    if config.owner_ids.is_empty() {
        info!("No owner IDs configured (OWNER_IDS is empty)");
    } else {
        info!("Bot owners: {:?}", config.owner_ids);
    }

    let dispatcher = bot::build_dispatcher(bot.clone(), store, &config);
    bot::run(&config, bot, dispatcher).await
}
