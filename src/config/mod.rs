//! Configuration module.
//!
//! Loads configuration from environment variables (and `.env`).

use std::env;
use std::time::Duration;

use anyhow::{anyhow, Context};
use crate::i18n;

/// Bot running mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BotMode {
    #[default]
    Polling,
    Webhook,
}

impl BotMode {
    fn parse(raw: &str) -> anyhow::Result<Self> {
        match raw.trim().to_lowercase().as_str() {
            "" | "polling" => Ok(Self::Polling),
            "webhook" => Ok(Self::Webhook),
            other => Err(anyhow!("BOT_MODE must be polling or webhook, got {other:?}")),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    // Telegram
    pub bot_token: String,
    pub bot_mode: BotMode,
    pub webhook_url: Option<String>,
    pub webhook_port: u16,
    pub webhook_secret: Option<String>,

    /// Users allowed to run /broadcast and /stats.
    pub owner_ids: Vec<u64>,

    // MongoDB. Without a URI settings are kept in memory.
    pub mongodb_uri: Option<String>,
    pub mongodb_database: String,

    /// How long a warning stays in the group before it is removed.
    pub warning_ttl: Duration,

    pub lang: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let bot_token = non_empty("BOT_TOKEN").context("BOT_TOKEN must be set")?;
        let bot_mode = BotMode::parse(&env::var("BOT_MODE").unwrap_or_default())?;

        let webhook_url = non_empty("WEBHOOK_URL");
        if bot_mode == BotMode::Webhook && webhook_url.is_none() {
            return Err(anyhow!("WEBHOOK_URL must be set when BOT_MODE is webhook"));
        }

        let webhook_port = match non_empty("WEBHOOK_PORT") {
            Some(port) => port
                .parse()
                .with_context(|| format!("invalid WEBHOOK_PORT {port:?}"))?,
            None => 8443,
        };

        let warning_ttl_secs: u64 = match non_empty("WARNING_TTL_SECS") {
            Some(secs) => secs
                .parse()
                .with_context(|| format!("invalid WARNING_TTL_SECS {secs:?}"))?,
            None => 10,
        };

        Ok(Self {
            bot_token,
            bot_mode,
            webhook_url,
            webhook_port,
            webhook_secret: non_empty("WEBHOOK_SECRET"),
            owner_ids: parse_owner_ids(&env::var("OWNER_IDS").unwrap_or_default()),
            mongodb_uri: non_empty("MONGODB_URI"),
            mongodb_database: non_empty("MONGODB_DATABASE")
                .unwrap_or_else(|| "channel_gate".to_string()),
            warning_ttl: Duration::from_secs(warning_ttl_secs),
            lang: i18n::resolve_locale(non_empty("BOT_LANG").as_deref()),
        })
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Comma separated user ids; entries that are not numbers are skipped.
fn parse_owner_ids(raw: &str) -> Vec<u64> {
    raw.split(',')
        .filter_map(|s| s.trim().parse::<u64>().ok())
        .collect()
}
