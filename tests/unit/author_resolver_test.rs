//! Unit tests for resolving the author of inbound activities.

use fedmarks::database::Database;
use fedmarks::managers::group_manager::GroupManager;
use fedmarks::managers::profile_manager::{ProfileManager, ProfileRepository};
use fedmarks::services::author_resolver::{check_authorship, ensure_actor_profile, FeedOwner};
use fedmarks::types::activity::{Activity, ActivityObject};
use fedmarks::types::errors::{BookmarkError, ErrorKind};
use fedmarks::types::profile::{NewProfile, Profile};

fn actor(id: &str) -> ActivityObject {
    ActivityObject {
        id: Some(id.to_string()),
        object_type: "person".to_string(),
        title: Some("Bob Remote".to_string()),
        link: Some("http://remote.example/bob".to_string()),
        ..ActivityObject::default()
    }
}

fn activity_by(actor: Option<ActivityObject>) -> Activity {
    Activity {
        verb: "post".to_string(),
        actor,
        ..Activity::default()
    }
}

fn feed_owner(db: &Database) -> Profile {
    ProfileManager::new(db.connection())
        .create(&NewProfile {
            uri: "http://remote.example/user/1".to_string(),
            nickname: "bob".to_string(),
            ..NewProfile::default()
        })
        .unwrap()
}

#[test]
fn test_profile_feed_without_actor_is_owner() {
    let db = Database::open_in_memory().expect("Failed to open in-memory database");
    let owner = feed_owner(&db);
    let profiles = ProfileManager::new(db.connection());

    let author = check_authorship(&activity_by(None), &FeedOwner::Profile(owner.clone()), &profiles).unwrap();
    assert_eq!(author, owner);
}

#[test]
fn test_profile_feed_matching_actor_is_owner() {
    let db = Database::open_in_memory().expect("Failed to open in-memory database");
    let owner = feed_owner(&db);
    let profiles = ProfileManager::new(db.connection());

    let activity = activity_by(Some(actor(&owner.uri)));
    let author = check_authorship(&activity, &FeedOwner::Profile(owner.clone()), &profiles).unwrap();
    assert_eq!(author.id, owner.id);
}

#[test]
fn test_profile_feed_foreign_actor_is_rejected() {
    let db = Database::open_in_memory().expect("Failed to open in-memory database");
    let owner = feed_owner(&db);
    let profiles = ProfileManager::new(db.connection());

    let activity = activity_by(Some(actor("http://elsewhere.example/user/9")));
    let err = check_authorship(&activity, &FeedOwner::Profile(owner), &profiles).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorship);
    assert!(profiles.find_by_uri("http://elsewhere.example/user/9").unwrap().is_none());
}

#[test]
fn test_group_feed_resolves_member() {
    let db = Database::open_in_memory().expect("Failed to open in-memory database");
    let group = GroupManager::new(db.connection())
        .create("http://remote.example/group/rust", "rust", Some("Rustaceans"), false)
        .unwrap();
    let profiles = ProfileManager::new(db.connection());

    let activity = activity_by(Some(actor("http://remote.example/user/42")));
    let author = check_authorship(&activity, &FeedOwner::Group(group), &profiles).unwrap();
    assert_eq!(author.uri, "http://remote.example/user/42");
    assert!(!author.is_local);
    assert_eq!(author.fullname.as_deref(), Some("Bob Remote"));
}

#[test]
fn test_ensure_actor_profile_is_idempotent() {
    let db = Database::open_in_memory().expect("Failed to open in-memory database");
    let profiles = ProfileManager::new(db.connection());
    let activity = activity_by(Some(actor("http://remote.example/user/42")));

    let first = ensure_actor_profile(&activity, &profiles).unwrap();
    let second = ensure_actor_profile(&activity, &profiles).unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(first.nickname, "bob");
}

#[test]
fn test_missing_actor_is_authorship_error() {
    let db = Database::open_in_memory().expect("Failed to open in-memory database");
    let profiles = ProfileManager::new(db.connection());

    let err = ensure_actor_profile(&activity_by(None), &profiles).unwrap_err();
    assert!(matches!(err, BookmarkError::Authorship(_)));
}

#[test]
fn test_actor_without_id_is_authorship_error() {
    let db = Database::open_in_memory().expect("Failed to open in-memory database");
    let profiles = ProfileManager::new(db.connection());
    let anonymous = ActivityObject {
        object_type: "person".to_string(),
        ..ActivityObject::default()
    };

    let err = ensure_actor_profile(&activity_by(Some(anonymous)), &profiles).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorship);
}
