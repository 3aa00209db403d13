//! Bookmark plugin.
//!
//! Wires the ingestion pipeline (classifier, link extractor, author
//! resolver, bookmark store) and the post renderer into the post lifecycle
//! events.

use std::sync::Arc;

use rusqlite::Connection;
use tracing::info;

use crate::database::Database;
use crate::managers::bookmark_manager::{BookmarkManager, BookmarkManagerTrait};
use crate::managers::group_manager::GroupManager;
use crate::managers::post_manager::{PostManager, PostRepository};
use crate::managers::profile_manager::ProfileManager;
use crate::services::activity_classifier::is_post_bookmark;
use crate::services::author_resolver::{check_authorship, ensure_actor_profile, FeedOwner};
use crate::services::delicious_importer::{
    DeliciousBackupImporter, DeliciousBookmarkImporter, BACKUP_HANDLER, BOOKMARK_HANDLER,
};
use crate::services::events::{HookOutcome, PluginVersion, PostEventHandler, SalmonTarget};
use crate::services::job_queue::QueueManager;
use crate::services::link_extractor::LinkExtractor;
use crate::services::post_renderer;
use crate::types::activity::{Activity, ActivityObject};
use crate::types::bookmark::{source, SaveOptions};
use crate::types::errors::BookmarkError;
use crate::types::post::{Post, PostOrigin};
use crate::types::profile::Profile;
use crate::types::settings::{AttachmentSettings, SiteSettings};

pub const VERSION: &str = "0.1";

/// Right to bulk-import a del.icio.us export.
pub const IMPORT_DELICIOUS: &str = "import_delicious";

pub struct BookmarkPlugin {
    db: Arc<Database>,
    site: SiteSettings,
    display: AttachmentSettings,
}

impl BookmarkPlugin {
    pub fn new(db: Arc<Database>, site: SiteSettings, display: AttachmentSettings) -> Self {
        Self { db, site, display }
    }

    /// Saves a bookmark from a federated (PuSH or Salmon) delivery.
    fn post_remote_bookmark(
        &self,
        conn: &Connection,
        author: &Profile,
        activity: &Activity,
    ) -> Result<Post, BookmarkError> {
        let object = activity.first_object().ok_or(BookmarkError::MissingObject)?;
        let options = SaveOptions {
            uri: object.id.clone(),
            url: object.link.clone(),
            origin: PostOrigin::Remote,
            source: Some(source::OSTATUS.to_string()),
            ..SaveOptions::default()
        };
        Self::post_bookmark(conn, &self.site, author, activity, options)
    }

    fn post_bookmark(
        conn: &Connection,
        site: &SiteSettings,
        profile: &Profile,
        activity: &Activity,
        options: SaveOptions,
    ) -> Result<Post, BookmarkError> {
        let profiles = ProfileManager::new(conn);
        let groups = GroupManager::new(conn);
        let posts = PostManager::new(conn);
        let extracted = LinkExtractor::new(&profiles, &groups, &posts).extract(activity, options)?;

        let mut store = BookmarkManager::new(conn, site);
        let (_, post) = store.save_new(
            profile,
            &extracted.title,
            &extracted.url,
            &extracted.tags,
            &extracted.description,
            extracted.options,
        )?;
        Ok(post)
    }

    fn check_salmon_addressing(
        conn: &Connection,
        activity: &Activity,
        target: &SalmonTarget,
    ) -> Result<(), BookmarkError> {
        let attention = &activity.context.attention;
        match target {
            SalmonTarget::Group(group) => {
                if !attention.contains(&group.uri) {
                    return Err(BookmarkError::NotAddressed(
                        "Bookmark not posted to this group.".to_string(),
                    ));
                }
            }
            SalmonTarget::User(user) => {
                let original = match activity.context.reply_to_id.as_deref() {
                    Some(uri) => PostManager::new(conn).find_by_uri(uri)?,
                    None => None,
                };
                let replies_to_user = original.is_some_and(|o| o.profile_id == user.id);
                if !attention.contains(&user.uri) && !replies_to_user {
                    return Err(BookmarkError::NotAddressed(
                        "Bookmark not posted to this user.".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}

impl PostEventHandler for BookmarkPlugin {
    fn name(&self) -> &str {
        "Bookmark"
    }

    fn on_feed_entry(&self, activity: &Activity, owner: &FeedOwner) -> Result<HookOutcome, BookmarkError> {
        info!("bookmark plugin called for new feed entry");
        if !is_post_bookmark(activity) {
            return Ok(HookOutcome::Continue);
        }
        info!(activity = ?activity.id, "importing activity as a bookmark");

        let post = self.db.in_transaction(|conn| {
            let author = check_authorship(activity, owner, &ProfileManager::new(conn))?;
            self.post_remote_bookmark(conn, &author, activity)
        })?;
        Ok(HookOutcome::Handled(post))
    }

    fn on_salmon_target(&self, activity: &Activity, target: &SalmonTarget) -> Result<HookOutcome, BookmarkError> {
        if !is_post_bookmark(activity) {
            return Ok(HookOutcome::Continue);
        }
        info!(activity = ?activity.id, "checking activity as a valid Salmon slap");

        let post = self.db.in_transaction(|conn| {
            Self::check_salmon_addressing(conn, activity, target)?;
            let author = ensure_actor_profile(activity, &ProfileManager::new(conn))?;
            self.post_remote_bookmark(conn, &author, activity)
        })?;
        Ok(HookOutcome::Handled(post))
    }

    fn on_atompub_new_activity(&self, activity: &Activity, user: &Profile) -> Result<HookOutcome, BookmarkError> {
        if !is_post_bookmark(activity) {
            return Ok(HookOutcome::Continue);
        }
        let options = SaveOptions {
            source: Some(source::ATOMPUB.to_string()),
            ..SaveOptions::default()
        };
        let post = Self::post_bookmark(self.db.connection(), &self.site, user, activity, options)?;
        Ok(HookOutcome::Handled(post))
    }

    fn on_import_activity(
        &self,
        user: &Profile,
        activity: &Activity,
        _trusted: bool,
    ) -> Result<HookOutcome, BookmarkError> {
        if !is_post_bookmark(activity) {
            return Ok(HookOutcome::Continue);
        }
        let object = activity.first_object().ok_or(BookmarkError::MissingObject)?;
        info!(bookmark = ?object.id, user = %user.nickname, "importing bookmark");

        let options = SaveOptions {
            uri: object.id.clone(),
            url: object.link.clone(),
            source: Some(source::RESTORE.to_string()),
            ..SaveOptions::default()
        };
        let post = Self::post_bookmark(self.db.connection(), &self.site, user, activity, options)?;
        Ok(HookOutcome::Handled(post))
    }

    fn on_activity_object_from_post(&self, post: &Post) -> Result<Option<ActivityObject>, BookmarkError> {
        info!(post = %post.uri, "checking post to see if it's a bookmark");
        let conn = self.db.connection();
        let Some(bookmark) = BookmarkManager::new(conn, &self.site).get_by_post(post)? else {
            return Ok(None);
        };

        info!(post = %post.uri, "formatting post as a bookmark");
        let attachments = PostManager::new(conn).attachments(post.id)?;
        post_renderer::object_from_bookmark(
            &bookmark,
            post,
            &attachments,
            &self.site.root_url(),
            &self.display,
        )
        .map(Some)
    }

    fn on_post_delete_related(&self, post: &Post) -> Result<(), BookmarkError> {
        BookmarkManager::new(self.db.connection(), &self.site).delete_by_post(post)?;
        Ok(())
    }

    fn on_initialize_queue(&self, queue: &mut dyn QueueManager) {
        queue.connect(BACKUP_HANDLER, Box::new(DeliciousBackupImporter::new()));
        queue.connect(
            BOOKMARK_HANDLER,
            Box::new(DeliciousBookmarkImporter::new(self.db.clone(), self.site.clone())),
        );
    }

    fn on_user_rights_check(&self, profile: &Profile, right: &str) -> Option<bool> {
        if right == IMPORT_DELICIOUS {
            Some(!profile.silenced)
        } else {
            None
        }
    }

    fn on_plugin_version(&self, versions: &mut Vec<PluginVersion>) {
        versions.push(PluginVersion {
            name: "Bookmark".to_string(),
            version: VERSION.to_string(),
            author: env!("CARGO_PKG_AUTHORS").to_string(),
            homepage: String::new(),
            description: "Simple extension for supporting bookmarks.".to_string(),
        });
    }
}
