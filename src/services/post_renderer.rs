//! Post Renderer.
//!
//! Formats a stored bookmark and its owning post back into the activity wire
//! shape, for outbound federation and for display confirmation.

use tracing::error;

use crate::managers::group_manager::GroupRepository;
use crate::managers::post_manager::PostRepository;
use crate::managers::profile_manager::ProfileRepository;
use crate::types::activity::{
    Activity, ActivityContext, ActivityLocation, ActivityObject, Category, Link, OBJECT_BOOKMARK,
    OBJECT_PERSON, REL_PREVIEW, REL_RELATED, VERB_POST,
};
use crate::types::bookmark::Bookmark;
use crate::types::errors::BookmarkError;
use crate::types::post::{Attachment, Post};
use crate::types::profile::Profile;
use crate::types::settings::AttachmentSettings;

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Renders the bookmark object. `attachments` must be the post's
/// attachments; a bookmark post references exactly one. The preview link
/// is only emitted when `display.show_thumbs` is set.
pub fn object_from_bookmark(
    bookmark: &Bookmark,
    post: &Post,
    attachments: &[Attachment],
    site_root: &str,
    display: &AttachmentSettings,
) -> Result<ActivityObject, BookmarkError> {
    let target = match attachments {
        [only] => only,
        _ => {
            error!(post = %post.uri, count = attachments.len(), "bookmark post with the wrong number of attachments");
            return Err(BookmarkError::AttachmentCount {
                post_uri: post.uri.clone(),
                count: attachments.len(),
            });
        }
    };

    let mut links = vec![Link {
        rel: REL_RELATED.to_string(),
        href: target.url.clone(),
        title: target.title.clone().filter(|t| !t.is_empty()),
        media_width: None,
        media_height: None,
    }];

    if let Some(thumbnail) = target.thumbnail.as_ref().filter(|_| display.show_thumbs) {
        links.push(Link {
            rel: REL_PREVIEW.to_string(),
            href: thumbnail.url.clone(),
            title: None,
            media_width: thumbnail.width.filter(|w| *w > 0),
            media_height: thumbnail.height.filter(|h| *h > 0),
        });
    }

    Ok(ActivityObject {
        id: Some(post.uri.clone()),
        object_type: OBJECT_BOOKMARK.to_string(),
        title: non_empty(&bookmark.title),
        summary: non_empty(&bookmark.description),
        link: Some(post.best_url(site_root)),
        links,
    })
}

/// Actor object for a profile.
pub fn object_from_profile(profile: &Profile) -> ActivityObject {
    ActivityObject {
        id: Some(profile.uri.clone()),
        object_type: OBJECT_PERSON.to_string(),
        title: Some(profile.best_name().to_string()),
        summary: None,
        link: profile.profile_url.clone(),
        links: Vec::new(),
    }
}

/// Renders the full "post a bookmark" activity, including actor, tags,
/// location and addressing.
pub fn activity_from_bookmark(
    bookmark: &Bookmark,
    post: &Post,
    posts: &dyn PostRepository,
    profiles: &dyn ProfileRepository,
    groups: &dyn GroupRepository,
    site_root: &str,
    display: &AttachmentSettings,
) -> Result<Activity, BookmarkError> {
    let attachments = posts.attachments(post.id)?;
    let object = object_from_bookmark(bookmark, post, &attachments, site_root, display)?;

    let actor = profiles
        .get_by_id(post.profile_id)?
        .map(|profile| object_from_profile(&profile));

    let categories = posts
        .tags(post.id)?
        .into_iter()
        .map(|term| Category { term, label: None })
        .collect();

    let mut attention = Vec::new();
    for profile_id in posts.reply_profile_ids(post.id)? {
        if let Some(profile) = profiles.get_by_id(profile_id)? {
            attention.push(profile.uri);
        }
    }
    for group_id in posts.group_ids(post.id)? {
        if let Some(group) = groups.get_by_id(group_id)? {
            attention.push(group.uri);
        }
    }

    let reply_to_id = match post.reply_to {
        Some(parent_id) => posts.get_by_id(parent_id)?.map(|parent| parent.uri),
        None => None,
    };

    let location = post.location.as_ref().map(|geo| ActivityLocation {
        lat: geo.lat,
        lon: geo.lon,
        location_ns: geo.location_ns,
        location_id: geo.location_id.clone(),
    });

    Ok(Activity {
        id: Some(post.uri.clone()),
        verb: VERB_POST.to_string(),
        time: Some(post.created),
        actor,
        objects: vec![object],
        categories,
        context: ActivityContext {
            location,
            attention,
            reply_to_id,
        },
    })
}
