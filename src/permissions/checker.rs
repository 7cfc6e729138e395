//! Permission checker with caching.

use std::sync::Arc;

use teloxide::types::{ChatId, UserId};
use tracing::debug;

use crate::cache::{CacheConfig, TypedCache};
use crate::error::GateResult;
use crate::gateway::ChatGateway;

/// Cache key for admin lookups.
type AdminCacheKey = (i64, u64); // (chat_id, user_id)

#[derive(Clone)]
pub struct Permissions {
    gateway: Arc<dyn ChatGateway>,
    cache: TypedCache<AdminCacheKey, bool>,
    owner_ids: Vec<u64>,
}

impl Permissions {
    pub fn with_owners(gateway: Arc<dyn ChatGateway>, owner_ids: Vec<u64>) -> Self {
        let cache = TypedCache::new("admin_status", CacheConfig::admin_status());
        Self {
            gateway,
            cache,
            owner_ids,
        }
    }

    #[inline]
    pub fn is_bot_owner(&self, user_id: UserId) -> bool {
        self.owner_ids.contains(&user_id.0)
    }

    /// Whether the user administers the group itself. Bot owners get no
    /// special treatment here.
    pub async fn is_group_admin(&self, chat_id: ChatId, user_id: UserId) -> GateResult<bool> {
        let cache_key = (chat_id.0, user_id.0);

        if let Some(cached) = self.cache.get(&cache_key) {
            debug!("Admin cache hit for user {} in chat {}", user_id, chat_id);
            return Ok(cached);
        }

        debug!("Admin cache miss for user {} in chat {}", user_id, chat_id);
        let is_admin = self.gateway.get_chat_admin_status(chat_id, user_id).await?;

        // Cache non-admins too, they are the common case
        self.cache.insert(cache_key, is_admin);
        Ok(is_admin)
    }

    /// Whether the user may configure the group. Bot owners always may.
    pub async fn can_configure(&self, chat_id: ChatId, user_id: UserId) -> GateResult<bool> {
        if self.is_bot_owner(user_id) {
            return Ok(true);
        }
        self.is_group_admin(chat_id, user_id).await
    }

    /// Ask the Bot API again, replacing any cached answer.
    pub async fn refresh_group_admin(&self, chat_id: ChatId, user_id: UserId) -> GateResult<bool> {
        self.invalidate(chat_id, user_id);
        self.is_group_admin(chat_id, user_id).await
    }

    /// Drop a cached answer, e.g. after a failed admin-only action.
    pub fn invalidate(&self, chat_id: ChatId, user_id: UserId) {
        self.cache.invalidate(&(chat_id.0, user_id.0));
        debug!(
            "Invalidated admin cache for user {} in chat {}",
            user_id, chat_id
        );
    }
}
