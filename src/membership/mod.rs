//! Membership oracle.
//!
//! Answers whether a user may post in a group: unrestricted groups, group
//! admins and channel subscribers are admitted, everyone else is rejected.
//! Any lookup that cannot be completed admits the user, so a Bot API hiccup
//! never silences a whole group.

use std::sync::Arc;

use teloxide::types::{ChatId, UserId};
use tracing::{debug, warn};

use crate::database::{GroupConfig, SettingsStore};
use crate::gateway::{ChatGateway, MemberStatus};
use crate::permissions::Permissions;
use crate::utils::normalize_channel_handle;

/// Why a user was let through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmitReason {
    NoRestriction,
    StorageUnavailable,
    GroupAdmin,
    Subscribed,
    LookupFailed,
}

/// A rejection, with the settings it was decided against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Refusal {
    /// Channel status that caused the rejection.
    pub status: MemberStatus,
    pub config: GroupConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Admitted(AdmitReason),
    Rejected(Refusal),
}

impl Verdict {
    #[cfg(test)]
    pub fn is_admitted(&self) -> bool {
        matches!(self, Self::Admitted(_))
    }
}

#[derive(Clone)]
pub struct MembershipOracle {
    store: Arc<dyn SettingsStore>,
    gateway: Arc<dyn ChatGateway>,
    permissions: Permissions,
}

impl MembershipOracle {
    pub fn new(
        store: Arc<dyn SettingsStore>,
        gateway: Arc<dyn ChatGateway>,
        permissions: Permissions,
    ) -> Self {
        Self {
            store,
            gateway,
            permissions,
        }
    }

    /// Load the group's settings and decide for `user_id`.
    pub async fn is_admitted(&self, group_id: ChatId, user_id: UserId) -> Verdict {
        match self.store.get(group_id.0).await {
            Ok(Some(config)) => self.evaluate(config, user_id).await,
            Ok(None) => Verdict::Admitted(AdmitReason::NoRestriction),
            Err(e) => {
                warn!("Settings for {} unavailable, admitting: {}", group_id, e);
                Verdict::Admitted(AdmitReason::StorageUnavailable)
            }
        }
    }

    async fn evaluate(&self, config: GroupConfig, user_id: UserId) -> Verdict {
        let Some(channel) = config.restriction() else {
            return Verdict::Admitted(AdmitReason::NoRestriction);
        };
        let channel = normalize_channel_handle(channel);
        let group_id = ChatId(config.group_id);

        match self.permissions.is_group_admin(group_id, user_id).await {
            Ok(true) => return Verdict::Admitted(AdmitReason::GroupAdmin),
            Ok(false) => {}
            // Not fatal: the channel check below still decides
            Err(e) => debug!("Admin check for {} in {} failed: {}", user_id, group_id, e),
        }

        let status = match self.gateway.get_membership_status(&channel, user_id).await {
            Ok(status) if status.is_subscribed() => {
                return Verdict::Admitted(AdmitReason::Subscribed);
            }
            Ok(status) => status,
            Err(e) => {
                warn!(
                    "Membership of {} in {} could not be checked, admitting: {}",
                    user_id, channel, e
                );
                return Verdict::Admitted(AdmitReason::LookupFailed);
            }
        };

        // The cached "not an admin" may predate a promotion
        if let Ok(true) = self.permissions.refresh_group_admin(group_id, user_id).await {
            return Verdict::Admitted(AdmitReason::GroupAdmin);
        }

        debug!(
            "User {} is {:?} in {}, rejecting in {}",
            user_id, status, channel, group_id
        );
        Verdict::Rejected(Refusal { status, config })
    }
}
