//! Settings store port and its implementations.

mod memory_store;
mod settings_repository;

use async_trait::async_trait;

use crate::database::models::{ChannelStats, GroupConfig};
use crate::error::GateResult;

pub use memory_store::MemorySettingsStore;
pub use settings_repository::MongoSettingsStore;

/// Durable per-group gate configuration.
///
/// Writes are full replaces: a caller changing one field passes the current
/// value of the other.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get(&self, group_id: i64) -> GateResult<Option<GroupConfig>>;

    /// Upsert the row. `None` warning text stores the default text.
    async fn put(
        &self,
        group_id: i64,
        required_channel: Option<String>,
        warning_text: Option<String>,
    ) -> GateResult<GroupConfig>;

    /// Remove the row. Returns whether one existed; absence is not an error.
    async fn delete(&self, group_id: i64) -> GateResult<bool>;

    async fn list_group_ids(&self) -> GateResult<Vec<i64>>;

    async fn stats(&self, top_n: usize) -> GateResult<ChannelStats>;
}
