//! Caching built on Moka.
//!
//! Hot-path lookups (group settings, admin status) go through a `TypedCache`
//! so repeated messages in the same group do not hit MongoDB or the Bot API.

mod config;
mod typed;

pub use config::CacheConfig;
pub use typed::TypedCache;
