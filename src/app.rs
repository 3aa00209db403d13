//! App Core for fedmarks.
//!
//! Central struct holding the database, settings, event dispatcher and job
//! queue, and exposing the entry points transports call into.

use std::sync::Arc;

use tracing::{debug, info};

use crate::database::Database;
use crate::managers::bookmark_manager::{BookmarkManager, BookmarkManagerTrait};
use crate::managers::group_manager::GroupManager;
use crate::managers::post_manager::{PostManager, PostRepository};
use crate::managers::profile_manager::ProfileManager;
use crate::services::author_resolver::FeedOwner;
use crate::services::bookmark_plugin::{BookmarkPlugin, IMPORT_DELICIOUS};
use crate::services::delicious_importer::{BackupJob, BACKUP_HANDLER};
use crate::services::events::{EventDispatcher, HookOutcome, PluginVersion, SalmonTarget};
use crate::services::job_queue::{InProcessQueue, Job, QueueManager, QueueReport};
use crate::services::post_renderer;
use crate::types::activity::{Activity, ActivityObject};
use crate::types::errors::{BookmarkError, ImportError};
use crate::types::post::Post;
use crate::types::profile::Profile;
use crate::types::settings::FedmarksSettings;

/// Central application struct.
///
/// Managers borrow the connection with a lifetime, so they are created on
/// demand via `BookmarkManager::new(app.db.connection(), &app.settings.site)`.
pub struct App {
    pub db: Arc<Database>,
    pub settings: FedmarksSettings,
    dispatcher: EventDispatcher,
    queue: InProcessQueue,
}

impl App {
    /// Opens the database at `db_path` and registers the bookmark plugin.
    pub fn new(db_path: &str, settings: FedmarksSettings) -> Result<Self, Box<dyn std::error::Error>> {
        let db = Arc::new(Database::open(db_path)?);
        Ok(Self::with_database(db, settings))
    }

    /// Same as [`App::new`] on a fresh in-memory database.
    pub fn in_memory(settings: FedmarksSettings) -> Result<Self, Box<dyn std::error::Error>> {
        let db = Arc::new(Database::open_in_memory()?);
        Ok(Self::with_database(db, settings))
    }

    fn with_database(db: Arc<Database>, settings: FedmarksSettings) -> Self {
        let mut dispatcher = EventDispatcher::new();
        dispatcher.register(Box::new(BookmarkPlugin::new(
            db.clone(),
            settings.site.clone(),
            settings.attachments.clone(),
        )));

        let mut queue = InProcessQueue::new();
        dispatcher.initialize_queue(&mut queue);
        debug!(handlers = ?queue.handler_names(), "job queue ready");

        Self {
            db,
            settings,
            dispatcher,
            queue,
        }
    }

    pub fn dispatcher(&self) -> &EventDispatcher {
        &self.dispatcher
    }

    /// A push-delivered feed entry from `owner`'s feed.
    pub fn receive_feed_entry(&self, activity: &Activity, owner: &FeedOwner) -> Result<Option<Post>, BookmarkError> {
        Ok(handled(self.dispatcher.feed_entry(activity, owner)?))
    }

    /// A Salmon slap addressed to a local user or group.
    pub fn receive_salmon(&self, activity: &Activity, target: &SalmonTarget) -> Result<Option<Post>, BookmarkError> {
        Ok(handled(self.dispatcher.salmon_target(activity, target)?))
    }

    /// A local user's AtomPub submission.
    pub fn post_via_atompub(&self, activity: &Activity, user: &Profile) -> Result<Option<Post>, BookmarkError> {
        Ok(handled(self.dispatcher.atompub_new_activity(activity, user)?))
    }

    /// An activity from `user`'s backup archive.
    pub fn import_activity(&self, user: &Profile, activity: &Activity, trusted: bool) -> Result<Option<Post>, BookmarkError> {
        Ok(handled(self.dispatcher.import_activity(user, activity, trusted)?))
    }

    /// The activity object for `post`, if a handler knows how to render it.
    pub fn render_post(&self, post: &Post) -> Result<Option<ActivityObject>, BookmarkError> {
        self.dispatcher.activity_object_from_post(post)
    }

    /// The full "post" activity for a bookmark post, or `None` if `post` is
    /// not a bookmark.
    pub fn render_activity(&self, post: &Post) -> Result<Option<Activity>, BookmarkError> {
        let conn = self.db.connection();
        let Some(bookmark) = BookmarkManager::new(conn, &self.settings.site).get_by_post(post)? else {
            return Ok(None);
        };
        post_renderer::activity_from_bookmark(
            &bookmark,
            post,
            &PostManager::new(conn),
            &ProfileManager::new(conn),
            &GroupManager::new(conn),
            &self.settings.site.root_url(),
            &self.settings.attachments,
        )
        .map(Some)
    }

    /// Deletes a post together with everything hanging off it. Returns
    /// false if there is no such post.
    pub fn delete_post(&self, post_id: i64) -> Result<bool, BookmarkError> {
        self.db.in_transaction(|conn| {
            let posts = PostManager::new(conn);
            let Some(post) = posts.get_by_id(post_id)? else {
                return Ok(false);
            };
            self.dispatcher.post_delete_related(&post)?;
            posts.delete_post(post.id)?;
            info!(post = %post.uri, "deleted post");
            Ok(true)
        })
    }

    pub fn has_right(&self, profile: &Profile, right: &str) -> bool {
        self.dispatcher.user_has_right(profile, right)
    }

    pub fn plugin_versions(&self) -> Vec<PluginVersion> {
        self.dispatcher.plugin_versions()
    }

    /// Queues a del.icio.us export for import into `profile`'s bookmarks.
    /// Call [`App::run_queue`] to process it.
    pub fn import_delicious(&mut self, profile: &Profile, export_html: &str) -> Result<(), ImportError> {
        if !self.settings.bookmark.import_enabled {
            return Err(ImportError::Disabled);
        }
        if !self.has_right(profile, IMPORT_DELICIOUS) {
            return Err(ImportError::PermissionDenied(profile.nickname.clone()));
        }

        let job = Job::new(
            BACKUP_HANDLER,
            &BackupJob {
                profile_id: profile.id,
                export_html: export_html.to_string(),
                max_entries: self.settings.bookmark.max_import_batch,
            },
        )?;
        self.queue.enqueue(job)?;
        info!(profile = %profile.nickname, "queued bookmark export for import");
        Ok(())
    }

    pub fn run_queue(&mut self) -> QueueReport {
        self.queue.run_pending()
    }
}

fn handled(outcome: HookOutcome) -> Option<Post> {
    match outcome {
        HookOutcome::Handled(post) => Some(post),
        HookOutcome::Continue => None,
    }
}
