//! fedmarks: federated social bookmarks.
//!
//! Recognizes "post a bookmark" activities arriving over feeds, Salmon,
//! AtomPub and backup restore, stores them as posts plus bookmark rows, and
//! renders stored bookmarks back into activities. Also imports del.icio.us
//! exports through a job queue.
//!
//! This library crate exposes all modules for use by the binary and integration tests.

pub mod app;
pub mod database;
pub mod managers;
pub mod services;
pub mod types;
