//! Data layer: wire entities mirroring the remote schema

pub mod models;

pub use models::{
    Comment, CommentDraft, Post, PostDraft, PostStatus, Profile, ProfilePatch, Session,
    SiteConfigEntry, User,
};
