//! Unit tests for the bookmark plugin's event hooks.

use std::sync::Arc;

use fedmarks::database::Database;
use fedmarks::managers::bookmark_manager::{BookmarkManager, BookmarkManagerTrait};
use fedmarks::managers::group_manager::GroupManager;
use fedmarks::managers::profile_manager::{ProfileManager, ProfileRepository};
use fedmarks::services::author_resolver::FeedOwner;
use fedmarks::services::bookmark_plugin::{BookmarkPlugin, IMPORT_DELICIOUS};
use fedmarks::services::events::{HookOutcome, PostEventHandler, SalmonTarget};
use fedmarks::types::activity::{Activity, ActivityObject, Link};
use fedmarks::types::errors::{BookmarkError, ErrorKind};
use fedmarks::types::post::{Post, PostOrigin};
use fedmarks::types::profile::{NewProfile, Profile};
use fedmarks::types::settings::{AttachmentSettings, SiteSettings};

fn setup() -> (Arc<Database>, BookmarkPlugin) {
    let db = Arc::new(Database::open_in_memory().expect("Failed to open in-memory database"));
    let plugin = BookmarkPlugin::new(db.clone(), SiteSettings::default(), AttachmentSettings::default());
    (db, plugin)
}

fn local_user(db: &Database, nickname: &str) -> Profile {
    ProfileManager::new(db.connection())
        .create(&NewProfile {
            uri: format!("http://localhost/user/{}", nickname),
            nickname: nickname.to_string(),
            is_local: true,
            ..NewProfile::default()
        })
        .unwrap()
}

fn remote_bookmark(actor_uri: &str, object_id: &str, target: &str) -> Activity {
    Activity {
        id: Some(format!("{}#activity", object_id)),
        verb: "http://activitystrea.ms/schema/1.0/post".to_string(),
        actor: Some(ActivityObject {
            id: Some(actor_uri.to_string()),
            object_type: "person".to_string(),
            ..ActivityObject::default()
        }),
        objects: vec![ActivityObject {
            id: Some(object_id.to_string()),
            object_type: "http://activitystrea.ms/schema/1.0/bookmark".to_string(),
            title: Some("Example".to_string()),
            link: Some(format!("{}/html", object_id)),
            links: vec![Link {
                rel: "related".to_string(),
                href: target.to_string(),
                ..Link::default()
            }],
            ..ActivityObject::default()
        }],
        ..Activity::default()
    }
}

fn handled(outcome: HookOutcome) -> Post {
    match outcome {
        HookOutcome::Handled(post) => post,
        HookOutcome::Continue => panic!("expected the bookmark plugin to handle the event"),
    }
}

fn count(db: &Database, table: &str) -> i64 {
    db.connection()
        .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
        .unwrap()
}

#[test]
fn test_feed_entry_stores_remote_bookmark() {
    let (db, plugin) = setup();
    let activity = remote_bookmark(
        "http://remote.example/user/bob",
        "http://remote.example/bookmark/1",
        "http://example.com/",
    );
    let owner = ProfileManager::new(db.connection())
        .ensure_remote_profile(activity.actor.as_ref().unwrap())
        .unwrap();

    let post = handled(plugin.on_feed_entry(&activity, &FeedOwner::Profile(owner.clone())).unwrap());
    assert_eq!(post.uri, "http://remote.example/bookmark/1");
    assert_eq!(post.url.as_deref(), Some("http://remote.example/bookmark/1/html"));
    assert_eq!(post.origin, PostOrigin::Remote);
    assert_eq!(post.source, "ostatus");
    assert_eq!(post.profile_id, owner.id);
}

#[test]
fn test_feed_entry_ignores_other_activities() {
    let (db, plugin) = setup();
    let owner = local_user(&db, "alice");
    let mut activity = remote_bookmark(&owner.uri, "http://localhost/note/1", "http://example.com/");
    activity.objects[0].object_type = "note".to_string();

    let outcome = plugin.on_feed_entry(&activity, &FeedOwner::Profile(owner)).unwrap();
    assert_eq!(outcome, HookOutcome::Continue);
    assert_eq!(count(&db, "posts"), 0);
}

#[test]
fn test_feed_entry_from_group_creates_no_profile_on_failure() {
    let (db, plugin) = setup();
    let group = GroupManager::new(db.connection())
        .create("http://remote.example/group/g", "g", None, false)
        .unwrap();
    let mut activity = remote_bookmark(
        "http://remote.example/user/carol",
        "http://remote.example/bookmark/2",
        "http://example.com/",
    );
    activity.objects[0].links.clear();

    let err = plugin.on_feed_entry(&activity, &FeedOwner::Group(group)).unwrap_err();
    assert!(matches!(err, BookmarkError::MissingTargetLink));
    assert_eq!(count(&db, "profiles"), 0, "placeholder profile is rolled back");
    assert_eq!(count(&db, "posts"), 0);
}

#[test]
fn test_salmon_to_group_requires_attention() {
    let (db, plugin) = setup();
    let group = GroupManager::new(db.connection())
        .create("http://localhost/group/rust", "rust", None, true)
        .unwrap();
    let mut activity = remote_bookmark(
        "http://remote.example/user/bob",
        "http://remote.example/bookmark/3",
        "http://example.com/",
    );

    let err = plugin
        .on_salmon_target(&activity, &SalmonTarget::Group(group.clone()))
        .unwrap_err();
    assert_eq!(err.to_string(), "Bookmark not posted to this group.");
    assert_eq!(err.kind(), ErrorKind::ClientInput);
    assert_eq!(count(&db, "profiles"), 0);

    activity.context.attention.push(group.uri.clone());
    let post = handled(plugin.on_salmon_target(&activity, &SalmonTarget::Group(group)).unwrap());
    assert_eq!(post.origin, PostOrigin::Remote);
}

#[test]
fn test_salmon_to_user_requires_attention_or_reply() {
    let (db, plugin) = setup();
    let alice = local_user(&db, "alice");
    let activity = remote_bookmark(
        "http://remote.example/user/bob",
        "http://remote.example/bookmark/4",
        "http://example.com/",
    );

    let err = plugin
        .on_salmon_target(&activity, &SalmonTarget::User(alice.clone()))
        .unwrap_err();
    assert_eq!(err.to_string(), "Bookmark not posted to this user.");

    // A reply to one of alice's posts counts as addressed to her.
    let (_, original) = BookmarkManager::new(db.connection(), &SiteSettings::default())
        .save_new(&alice, "Mine", "http://mine.example/", &[], "", Default::default())
        .unwrap();
    let mut reply = activity.clone();
    reply.context.reply_to_id = Some(original.uri.clone());

    let post = handled(plugin.on_salmon_target(&reply, &SalmonTarget::User(alice)).unwrap());
    assert_eq!(post.reply_to, Some(original.id));
}

#[test]
fn test_atompub_saves_local_bookmark() {
    let (db, plugin) = setup();
    let alice = local_user(&db, "alice");
    let activity = remote_bookmark(&alice.uri, "ignored", "http://example.com/");

    let post = handled(plugin.on_atompub_new_activity(&activity, &alice).unwrap());
    assert_eq!(post.source, "atompub");
    assert_eq!(post.origin, PostOrigin::LocalPublic);
    assert!(post.uri.starts_with("http://localhost/bookmark/"));
}

#[test]
fn test_import_activity_keeps_uri() {
    let (db, plugin) = setup();
    let alice = local_user(&db, "alice");
    let activity = remote_bookmark(&alice.uri, "http://old.example/bookmark/9", "http://example.com/");

    let post = handled(plugin.on_import_activity(&alice, &activity, true).unwrap());
    assert_eq!(post.uri, "http://old.example/bookmark/9");
    assert_eq!(post.source, "restore");
}

#[test]
fn test_activity_object_from_post() {
    let (db, plugin) = setup();
    let alice = local_user(&db, "alice");
    let activity = remote_bookmark(&alice.uri, "x", "http://example.com/");
    let post = handled(plugin.on_atompub_new_activity(&activity, &alice).unwrap());

    let object = plugin.on_activity_object_from_post(&post).unwrap().unwrap();
    assert_eq!(object.id.as_deref(), Some(post.uri.as_str()));
    assert_eq!(object.links_with_rel("related")[0].href, "http://example.com/");

    let mut not_bookmark = post.clone();
    not_bookmark.uri = "http://localhost/notice/999".to_string();
    assert!(plugin.on_activity_object_from_post(&not_bookmark).unwrap().is_none());
}

#[test]
fn test_post_delete_related_removes_bookmark() {
    let (db, plugin) = setup();
    let alice = local_user(&db, "alice");
    let activity = remote_bookmark(&alice.uri, "x", "http://example.com/");
    let post = handled(plugin.on_atompub_new_activity(&activity, &alice).unwrap());

    plugin.on_post_delete_related(&post).unwrap();
    assert_eq!(count(&db, "bookmarks"), 0);
}

#[test]
fn test_rights_and_version() {
    let (db, plugin) = setup();
    let alice = local_user(&db, "alice");
    assert_eq!(plugin.on_user_rights_check(&alice, IMPORT_DELICIOUS), Some(true));
    assert_eq!(plugin.on_user_rights_check(&alice, "delete_user"), None);

    ProfileManager::new(db.connection()).set_silenced(alice.id, true).unwrap();
    let silenced = ProfileManager::new(db.connection()).get_by_id(alice.id).unwrap().unwrap();
    assert_eq!(plugin.on_user_rights_check(&silenced, IMPORT_DELICIOUS), Some(false));

    let mut versions = Vec::new();
    plugin.on_plugin_version(&mut versions);
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0].name, "Bookmark");
    assert_eq!(versions[0].author, "Fedmarks Developers");
    assert_ne!(versions[0].author, "fedmarks", "author is not the package name");
}
