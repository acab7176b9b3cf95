//! Resource gateways
//!
//! CRUD façades over the remote gateway client, one per entity. Each
//! gateway encapsulates its entity's query shapes, filters, and
//! denormalization; errors surface as logged empty/neutral results on
//! read paths.

pub mod avatars;
pub mod comments;
pub mod posts;
pub mod profiles;
pub mod site_config;

pub use avatars::{Avatars, MAX_AVATAR_BYTES};
pub use comments::Comments;
pub use posts::{PostFilter, Posts};
pub use profiles::Profiles;
pub use site_config::SiteConfigStore;
