//! Database module exports.

mod models;
mod mongo;
mod repository;

use std::sync::Arc;

use tracing::warn;

pub use models::*;
pub use mongo::Database;
pub use repository::{MemorySettingsStore, MongoSettingsStore, SettingsStore};

/// Open the configured settings store.
///
/// Without a MongoDB URI the bot still runs, but settings only live as long as
/// the process.
pub async fn open_store(
    mongodb_uri: Option<&str>,
    mongodb_database: &str,
) -> anyhow::Result<Arc<dyn SettingsStore>> {
    match mongodb_uri {
        Some(uri) => {
            let db = Database::connect(uri, mongodb_database).await?;
            let store = MongoSettingsStore::new(&db).await?;
            Ok(Arc::new(store))
        }
        None => {
            warn!("MONGODB_URI not set, group settings will not survive a restart");
            Ok(Arc::new(MemorySettingsStore::new()))
        }
    }
}
