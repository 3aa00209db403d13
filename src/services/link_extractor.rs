//! Link Extractor.
//!
//! Pulls the bookmark target, tags, timestamp, geo-location, thumbnail and
//! addressing out of a "post a bookmark" activity and turns them into the
//! arguments of [`BookmarkManagerTrait::save_new`].
//!
//! [`BookmarkManagerTrait::save_new`]: crate::managers::bookmark_manager::BookmarkManagerTrait::save_new

use tracing::{debug, warn};
use url::Url;

use crate::managers::group_manager::GroupRepository;
use crate::managers::post_manager::PostRepository;
use crate::managers::profile_manager::ProfileRepository;
use crate::services::canonical::canonical_tags;
use crate::types::activity::{Activity, REL_PREVIEW, REL_RELATED};
use crate::types::bookmark::SaveOptions;
use crate::types::errors::BookmarkError;
use crate::types::post::{GeoPoint, Thumbnail};

/// Everything needed to store one bookmark.
#[derive(Debug, Clone)]
pub struct ExtractedBookmark {
    pub url: String,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub options: SaveOptions,
}

pub struct LinkExtractor<'r> {
    profiles: &'r dyn ProfileRepository,
    groups: &'r dyn GroupRepository,
    posts: &'r dyn PostRepository,
}

impl<'r> LinkExtractor<'r> {
    pub fn new(
        profiles: &'r dyn ProfileRepository,
        groups: &'r dyn GroupRepository,
        posts: &'r dyn PostRepository,
    ) -> Self {
        Self {
            profiles,
            groups,
            posts,
        }
    }

    /// Extracts the bookmark from `activity`, filling in `options` on top of
    /// whatever the caller already set (uri, url, origin, source).
    pub fn extract(
        &self,
        activity: &Activity,
        mut options: SaveOptions,
    ) -> Result<ExtractedBookmark, BookmarkError> {
        let object = activity.first_object().ok_or(BookmarkError::MissingObject)?;

        let related = object.links_with_rel(REL_RELATED);
        let target = match related.as_slice() {
            [] => return Err(BookmarkError::MissingTargetLink),
            [only] => *only,
            [first, ..] => {
                warn!(
                    count = related.len(),
                    object = ?object.id,
                    "got too many link rel=related in a bookmark, using the first"
                );
                *first
            }
        };
        Self::validate_target(&target.href)?;
        options.link_title = target.title.clone().filter(|t| !t.is_empty());

        if let Some(preview) = object.links_with_rel(REL_PREVIEW).first() {
            options.thumbnail = Some(Thumbnail {
                url: preview.href.clone(),
                width: preview.media_width,
                height: preview.media_height,
            });
        }

        let tags = canonical_tags(activity.categories.iter().map(|c| c.term.as_str()));

        if let Some(time) = activity.time {
            options.created = Some(time);
        }

        if let Some(location) = &activity.context.location {
            let named = location.location_id.is_some();
            options.location = Some(GeoPoint {
                lat: location.lat,
                lon: location.lon,
                location_ns: if named { location.location_ns } else { None },
                location_id: location.location_id.clone(),
            });
        }

        self.resolve_attention(&activity.context.attention, &mut options)?;

        if let Some(reply_to_uri) = activity.context.reply_to_id.as_deref() {
            if let Some(original) = self.posts.find_by_uri(reply_to_uri)? {
                options.reply_to = Some(original.id);
            }
        }

        Ok(ExtractedBookmark {
            url: target.href.clone(),
            title: object.title.clone().unwrap_or_default(),
            description: object.summary.clone().unwrap_or_default(),
            tags,
            options,
        })
    }

    /// Splits addressed URIs into reply recipients (profiles) and group
    /// recipients. URIs that resolve to neither are dropped.
    fn resolve_attention(&self, attention: &[String], options: &mut SaveOptions) -> Result<(), BookmarkError> {
        options.replies.clear();
        options.groups.clear();

        for uri in attention {
            if let Some(profile) = self.profiles.find_by_uri(uri)? {
                if !options.replies.contains(&profile.id) {
                    options.replies.push(profile.id);
                }
            } else if let Some(group) = self.groups.find_by_uri(uri)? {
                if !options.groups.contains(&group.id) {
                    options.groups.push(group.id);
                }
            } else {
                debug!(uri = %uri, "dropping unresolvable attention URI");
            }
        }
        Ok(())
    }

    /// Any absolute URL is a valid target, whatever its scheme.
    fn validate_target(href: &str) -> Result<(), BookmarkError> {
        match Url::parse(href.trim()) {
            Ok(_) => Ok(()),
            Err(_) => Err(BookmarkError::InvalidTargetLink(href.to_string())),
        }
    }
}
