// Shared type definitions: activities, posts, profiles, bookmarks, settings and errors.

pub mod activity;
pub mod bookmark;
pub mod errors;
pub mod post;
pub mod profile;
pub mod settings;
