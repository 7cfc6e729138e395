//! Permission checks.
//!
//! Two notions of privilege exist:
//!
//! - bot owners (`OWNER_IDS`), who may run owner commands anywhere
//! - group admins/creators, who configure their group and are exempt from the
//!   channel requirement
//!
//! Admin lookups are cached, since the moderation path asks on every message.

mod checker;

pub use checker::Permissions;
