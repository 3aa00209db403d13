//! Author Resolver.
//!
//! Maps the actor of an inbound activity to a local profile, either by
//! checking it against a transport-authenticated feed owner (push delivery)
//! or by looking up / materializing a federated profile (mention delivery).

use tracing::{info, warn};

use crate::managers::profile_manager::ProfileRepository;
use crate::types::activity::Activity;
use crate::types::errors::{BookmarkError, RepositoryError};
use crate::types::profile::{Profile, UserGroup};

/// The authenticated owner of a pushed feed.
#[derive(Debug, Clone)]
pub enum FeedOwner {
    Profile(Profile),
    Group(UserGroup),
}

/// Push-delivery path: the feed owner is already authenticated.
///
/// A profile feed may only carry the owner's own activities (an activity
/// without an actor is attributed to the owner). A group feed relays
/// members' activities, so the actor is resolved on its own.
pub fn check_authorship(
    activity: &Activity,
    owner: &FeedOwner,
    profiles: &dyn ProfileRepository,
) -> Result<Profile, BookmarkError> {
    match owner {
        FeedOwner::Profile(profile) => {
            let actor_id = activity.actor.as_ref().and_then(|a| a.id.as_deref());
            match actor_id {
                None => Ok(profile.clone()),
                Some(id) if id == profile.uri => Ok(profile.clone()),
                Some(id) => {
                    warn!(actor = id, feed_owner = %profile.uri, "activity actor does not match feed owner");
                    Err(BookmarkError::Authorship(format!(
                        "actor {} is not the owner of feed {}",
                        id, profile.uri
                    )))
                }
            }
        }
        FeedOwner::Group(group) => {
            info!(group = %group.uri, "resolving actor of group feed entry");
            ensure_actor_profile(activity, profiles)
        }
    }
}

/// Mention/reply path: look up or create the profile for the activity's
/// actor.
pub fn ensure_actor_profile(
    activity: &Activity,
    profiles: &dyn ProfileRepository,
) -> Result<Profile, BookmarkError> {
    let actor = activity
        .actor
        .as_ref()
        .ok_or_else(|| BookmarkError::Authorship("activity has no actor".to_string()))?;

    if actor.id.as_deref().map_or(true, str::is_empty) {
        return Err(BookmarkError::Authorship("actor has no id".to_string()));
    }

    profiles.ensure_remote_profile(actor).map_err(|e| match e {
        RepositoryError::DatabaseError(msg) => BookmarkError::DatabaseError(msg),
        other => BookmarkError::Authorship(other.to_string()),
    })
}
