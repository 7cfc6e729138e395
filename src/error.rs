//! Domain errors shared by the gate components.
//!
//! Adapters (Telegram, MongoDB) map their own errors into these.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    /// An admin answer was refused by the settings wizard.
    #[error("configuration rejected: {0}")]
    ConfigurationRejected(Rejection),

    #[error("storage error: {0}")]
    Storage(String),

    /// A membership or admin query could not be resolved.
    #[error("lookup failed: {0}")]
    LookupFailure(String),

    /// A best-effort side effect (send, delete, edit) failed.
    #[error("action failed: {0}")]
    ActionFailure(String),
}

/// Why the wizard refused an answer. Rendered to the admin via i18n.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    MissingMarker,
    NotAChannel,
    ChannelUnreachable,
    ChannelRequired,
    EmptyText,
}

impl Rejection {
    /// i18n key of the message shown to the admin.
    pub fn text_key(self) -> &'static str {
        match self {
            Self::MissingMarker => "wizard.error_missing_marker",
            Self::NotAChannel => "wizard.error_not_channel",
            Self::ChannelUnreachable => "wizard.error_unreachable",
            Self::ChannelRequired => "wizard.error_channel_first",
            Self::EmptyText => "wizard.error_empty_text",
        }
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            Self::MissingMarker => "handle must start with @",
            Self::NotAChannel => "handle does not point to a channel",
            Self::ChannelUnreachable => "channel could not be resolved",
            Self::ChannelRequired => "no channel configured yet",
            Self::EmptyText => "text is empty",
        };
        f.write_str(reason)
    }
}

impl From<mongodb::error::Error> for GateError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

pub type GateResult<T> = Result<T, GateError>;
