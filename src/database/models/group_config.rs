//! Per-group gate configuration.
//!
//! One document per group. A missing document, or a document without a
//! channel, means the group is unrestricted.

use mongodb::bson::oid::ObjectId;
use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

use crate::i18n;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupConfig {
    /// MongoDB document ID
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none", default)]
    pub id: Option<ObjectId>,

    /// Telegram chat ID of the group (unique)
    pub group_id: i64,

    /// Channel handle users must be subscribed to, always `@name`
    #[serde(rename = "channel_username", default)]
    pub required_channel: Option<String>,

    /// Text sent to users whose message was removed
    #[serde(rename = "welcome_message", default = "default_warning_text")]
    pub warning_text: String,

    /// Time of the last write, stored as a BSON date.
    #[serde(default = "now")]
    pub updated_at: DateTime,
}

/// Warning shown to rejected users when the group never set its own text,
/// in the bot's language.
pub fn default_warning_text() -> String {
    i18n::get_text(i18n::locale(), "moderation.default_warning")
}

fn now() -> DateTime {
    DateTime::from_millis(chrono::Utc::now().timestamp_millis())
}

impl GroupConfig {
    /// Build a full row. An omitted warning text falls back to the default.
    pub fn new(group_id: i64, required_channel: Option<String>, warning_text: Option<String>) -> Self {
        Self {
            id: None,
            group_id,
            required_channel,
            warning_text: warning_text.unwrap_or_else(default_warning_text),
            updated_at: now(),
        }
    }

    /// The channel to enforce, if any.
    pub fn restriction(&self) -> Option<&str> {
        self.required_channel.as_deref().filter(|c| !c.is_empty())
    }
}

/// Aggregate numbers for the owner `/stats` command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelStats {
    pub group_count: u64,
    /// (channel, number of groups requiring it), most used first.
    pub top_channels: Vec<(String, u64)>,
}
