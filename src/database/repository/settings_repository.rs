//! MongoDB-backed settings store.
//!
//! One document per group in `group_settings`, fronted by a moka cache since
//! every moderated message reads its group's row.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use mongodb::bson::{doc, Document};
use mongodb::options::{IndexOptions, ReplaceOptions};
use mongodb::{Collection, IndexModel};
use tracing::debug;

use super::SettingsStore;
use crate::cache::{CacheConfig, TypedCache};
use crate::database::models::{ChannelStats, GroupConfig};
use crate::database::Database;
use crate::error::GateResult;

pub struct MongoSettingsStore {
    collection: Collection<GroupConfig>,
    cache: TypedCache<i64, GroupConfig>,
}

impl MongoSettingsStore {
    /// Open the collection and make sure `group_id` is unique.
    pub async fn new(db: &Database) -> GateResult<Self> {
        let collection: Collection<GroupConfig> = db.collection("group_settings");

        let index = IndexModel::builder()
            .keys(doc! { "group_id": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        collection.create_index(index).await?;

        let cache = TypedCache::new(
            "group_settings",
            CacheConfig::with_capacity(5_000).ttl(Duration::from_secs(600)),
        );

        Ok(Self { collection, cache })
    }

    async fn save(&self, config: &GroupConfig) -> GateResult<()> {
        let filter = doc! { "group_id": config.group_id };
        let options = ReplaceOptions::builder().upsert(true).build();

        self.collection
            .replace_one(filter, config)
            .with_options(options)
            .await?;

        self.cache.insert(config.group_id, config.clone());
        debug!("Saved gate settings for {}", config.group_id);
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for MongoSettingsStore {
    async fn get(&self, group_id: i64) -> GateResult<Option<GroupConfig>> {
        if let Some(config) = self.cache.get(&group_id) {
            return Ok(Some(config));
        }

        let result = self
            .collection
            .find_one(doc! { "group_id": group_id })
            .await?;

        if let Some(config) = &result {
            self.cache.insert(group_id, config.clone());
        }

        Ok(result)
    }

    async fn put(
        &self,
        group_id: i64,
        required_channel: Option<String>,
        warning_text: Option<String>,
    ) -> GateResult<GroupConfig> {
        let config = GroupConfig::new(group_id, required_channel, warning_text);
        self.save(&config).await?;
        Ok(config)
    }

    async fn delete(&self, group_id: i64) -> GateResult<bool> {
        let result = self
            .collection
            .delete_one(doc! { "group_id": group_id })
            .await?;

        self.cache.invalidate(&group_id);

        debug!(
            "Deleted gate settings for {}: {}",
            group_id,
            result.deleted_count > 0
        );
        Ok(result.deleted_count > 0)
    }

    async fn list_group_ids(&self) -> GateResult<Vec<i64>> {
        let raw: Collection<Document> = self.collection.clone_with_type();
        let options = mongodb::options::FindOptions::builder()
            .projection(doc! { "group_id": 1, "_id": 0 })
            .build();

        let mut cursor = raw.find(doc! {}).with_options(options).await?;
        let mut ids = Vec::new();

        while let Some(result) = cursor.next().await {
            if let Ok(id) = result?.get_i64("group_id") {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    async fn stats(&self, top_n: usize) -> GateResult<ChannelStats> {
        let group_count = self.collection.count_documents(doc! {}).await?;

        let pipeline = vec![
            doc! { "$match": { "channel_username": { "$ne": null } } },
            doc! { "$group": { "_id": "$channel_username", "count": { "$sum": 1 } } },
            doc! { "$sort": { "count": -1, "_id": 1 } },
            doc! { "$limit": top_n as i64 },
        ];

        let mut cursor = self.collection.aggregate(pipeline).await?;
        let mut top_channels = Vec::new();

        while let Some(result) = cursor.next().await {
            let doc = result?;
            let Ok(channel) = doc.get_str("_id") else {
                continue;
            };
            // $sum yields i32 for small counts
            let count = doc
                .get_i32("count")
                .map(i64::from)
                .or_else(|_| doc.get_i64("count"))
                .unwrap_or(0);
            top_channels.push((channel.to_string(), count.max(0) as u64));
        }

        Ok(ChannelStats {
            group_count,
            top_channels,
        })
    }
}
