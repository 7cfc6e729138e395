//! Database models.

pub mod group_config;

pub use group_config::{ChannelStats, GroupConfig};
