//! Post lifecycle events.
//!
//! Handlers implement [`PostEventHandler`], overriding only the events they
//! care about, and are registered explicitly on an [`EventDispatcher`] at
//! startup. Ingestion events stop at the first handler that reports
//! [`HookOutcome::Handled`].

use tracing::debug;

use crate::services::author_resolver::FeedOwner;
use crate::services::job_queue::QueueManager;
use crate::types::activity::{Activity, ActivityObject};
use crate::types::errors::BookmarkError;
use crate::types::post::Post;
use crate::types::profile::{Profile, UserGroup};

/// Whether a handler consumed an ingestion event.
#[derive(Debug, Clone, PartialEq)]
pub enum HookOutcome {
    /// Not ours; offer the event to the next handler.
    Continue,
    /// Stored as this post.
    Handled(Post),
}

/// The local recipient a Salmon slap was delivered to.
#[derive(Debug, Clone)]
pub enum SalmonTarget {
    User(Profile),
    Group(UserGroup),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginVersion {
    pub name: String,
    pub version: String,
    pub author: String,
    pub homepage: String,
    pub description: String,
}

pub trait PostEventHandler {
    fn name(&self) -> &str;

    /// An entry arrived on a subscribed feed (push delivery).
    fn on_feed_entry(&self, _activity: &Activity, _owner: &FeedOwner) -> Result<HookOutcome, BookmarkError> {
        Ok(HookOutcome::Continue)
    }

    /// A signed activity was delivered to a local user or group.
    fn on_salmon_target(&self, _activity: &Activity, _target: &SalmonTarget) -> Result<HookOutcome, BookmarkError> {
        Ok(HookOutcome::Continue)
    }

    /// A local user posted an activity through the AtomPub API.
    fn on_atompub_new_activity(&self, _activity: &Activity, _user: &Profile) -> Result<HookOutcome, BookmarkError> {
        Ok(HookOutcome::Continue)
    }

    /// An activity is being restored from a user's backup.
    fn on_import_activity(
        &self,
        _user: &Profile,
        _activity: &Activity,
        _trusted: bool,
    ) -> Result<HookOutcome, BookmarkError> {
        Ok(HookOutcome::Continue)
    }

    /// A post is being rendered as an activity object. `None` leaves it to
    /// the default rendering.
    fn on_activity_object_from_post(&self, _post: &Post) -> Result<Option<ActivityObject>, BookmarkError> {
        Ok(None)
    }

    /// A post is about to be deleted; remove rows that hang off it.
    fn on_post_delete_related(&self, _post: &Post) -> Result<(), BookmarkError> {
        Ok(())
    }

    fn on_initialize_queue(&self, _queue: &mut dyn QueueManager) {}

    /// `Some(allowed)` if this handler decides `right` for `profile`.
    fn on_user_rights_check(&self, _profile: &Profile, _right: &str) -> Option<bool> {
        None
    }

    fn on_plugin_version(&self, _versions: &mut Vec<PluginVersion>) {}
}

/// Ordered list of registered handlers.
#[derive(Default)]
pub struct EventDispatcher {
    handlers: Vec<Box<dyn PostEventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handler: Box<dyn PostEventHandler>) {
        debug!(handler = handler.name(), "registering post event handler");
        self.handlers.push(handler);
    }

    pub fn handler_names(&self) -> Vec<&str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }

    fn first_handled<F>(&self, mut event: F) -> Result<HookOutcome, BookmarkError>
    where
        F: FnMut(&dyn PostEventHandler) -> Result<HookOutcome, BookmarkError>,
    {
        for handler in &self.handlers {
            if let HookOutcome::Handled(post) = event(handler.as_ref())? {
                return Ok(HookOutcome::Handled(post));
            }
        }
        Ok(HookOutcome::Continue)
    }

    pub fn feed_entry(&self, activity: &Activity, owner: &FeedOwner) -> Result<HookOutcome, BookmarkError> {
        self.first_handled(|h| h.on_feed_entry(activity, owner))
    }

    pub fn salmon_target(&self, activity: &Activity, target: &SalmonTarget) -> Result<HookOutcome, BookmarkError> {
        self.first_handled(|h| h.on_salmon_target(activity, target))
    }

    pub fn atompub_new_activity(&self, activity: &Activity, user: &Profile) -> Result<HookOutcome, BookmarkError> {
        self.first_handled(|h| h.on_atompub_new_activity(activity, user))
    }

    pub fn import_activity(
        &self,
        user: &Profile,
        activity: &Activity,
        trusted: bool,
    ) -> Result<HookOutcome, BookmarkError> {
        self.first_handled(|h| h.on_import_activity(user, activity, trusted))
    }

    pub fn activity_object_from_post(&self, post: &Post) -> Result<Option<ActivityObject>, BookmarkError> {
        for handler in &self.handlers {
            if let Some(object) = handler.on_activity_object_from_post(post)? {
                return Ok(Some(object));
            }
        }
        Ok(None)
    }

    pub fn post_delete_related(&self, post: &Post) -> Result<(), BookmarkError> {
        for handler in &self.handlers {
            handler.on_post_delete_related(post)?;
        }
        Ok(())
    }

    pub fn initialize_queue(&self, queue: &mut dyn QueueManager) {
        for handler in &self.handlers {
            handler.on_initialize_queue(queue);
        }
    }

    /// First handler with an opinion decides; rights are granted by default.
    pub fn user_has_right(&self, profile: &Profile, right: &str) -> bool {
        self.handlers
            .iter()
            .find_map(|h| h.on_user_rights_check(profile, right))
            .unwrap_or(true)
    }

    pub fn plugin_versions(&self) -> Vec<PluginVersion> {
        let mut versions = Vec::new();
        for handler in &self.handlers {
            handler.on_plugin_version(&mut versions);
        }
        versions
    }
}
