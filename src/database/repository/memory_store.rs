//! In-process settings store.
//!
//! Used when no MongoDB URI is configured, and as the backing store in tests.
//! Everything is lost on restart.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use parking_lot::RwLock;

use super::SettingsStore;
use crate::database::models::{ChannelStats, GroupConfig};
use crate::error::GateResult;

#[derive(Default)]
pub struct MemorySettingsStore {
    rows: RwLock<BTreeMap<i64, GroupConfig>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn get(&self, group_id: i64) -> GateResult<Option<GroupConfig>> {
        Ok(self.rows.read().get(&group_id).cloned())
    }

    async fn put(
        &self,
        group_id: i64,
        required_channel: Option<String>,
        warning_text: Option<String>,
    ) -> GateResult<GroupConfig> {
        let config = GroupConfig::new(group_id, required_channel, warning_text);
        self.rows.write().insert(group_id, config.clone());
        Ok(config)
    }

    async fn delete(&self, group_id: i64) -> GateResult<bool> {
        Ok(self.rows.write().remove(&group_id).is_some())
    }

    async fn list_group_ids(&self) -> GateResult<Vec<i64>> {
        Ok(self.rows.read().keys().copied().collect())
    }

    async fn stats(&self, top_n: usize) -> GateResult<ChannelStats> {
        let rows = self.rows.read();

        let mut counts: HashMap<&str, u64> = HashMap::new();
        for channel in rows.values().filter_map(|c| c.required_channel.as_deref()) {
            *counts.entry(channel).or_default() += 1;
        }

        let mut top_channels: Vec<(String, u64)> = counts
            .into_iter()
            .map(|(channel, count)| (channel.to_string(), count))
            .collect();
        top_channels.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        top_channels.truncate(top_n);

        Ok(ChannelStats {
            group_count: rows.len() as u64,
            top_channels,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::group_config::default_warning_text;

    #[tokio::test]
    async fn put_then_get_returns_row() {
        let store = MemorySettingsStore::new();
        store.put(-1, Some("@news".into()), None).await.unwrap();

        let config = store.get(-1).await.unwrap().unwrap();
        assert_eq!(config.required_channel.as_deref(), Some("@news"));
        assert_eq!(config.warning_text, default_warning_text());
        assert!(store.get(-2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn put_replaces_whole_row() {
        let store = MemorySettingsStore::new();
        store
            .put(-1, Some("@news".into()), Some("join first".into()))
            .await
            .unwrap();

        // Omitting the text on replace resets it to the default.
        store.put(-1, Some("@other".into()), None).await.unwrap();

        let config = store.get(-1).await.unwrap().unwrap();
        assert_eq!(config.required_channel.as_deref(), Some("@other"));
        assert_eq!(config.warning_text, default_warning_text());
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = MemorySettingsStore::new();
        assert!(!store.delete(-5).await.unwrap());

        store.put(-5, Some("@c".into()), None).await.unwrap();
        assert!(store.delete(-5).await.unwrap());
        assert!(!store.delete(-5).await.unwrap());
        assert!(store.get(-5).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn stats_rank_channels_by_usage() {
        let store = MemorySettingsStore::new();
        store.put(-1, Some("@a".into()), None).await.unwrap();
        store.put(-2, Some("@b".into()), None).await.unwrap();
        store.put(-3, Some("@b".into()), None).await.unwrap();
        store.put(-4, None, None).await.unwrap();

        let stats = store.stats(5).await.unwrap();
        assert_eq!(stats.group_count, 4);
        assert_eq!(
            stats.top_channels,
            vec![("@b".to_string(), 2), ("@a".to_string(), 1)]
        );

        assert_eq!(store.stats(1).await.unwrap().top_channels.len(), 1);
        assert_eq!(store.list_group_ids().await.unwrap(), vec![-4, -3, -2, -1]);
    }
}
