//! Unit tests for the BookmarkManager public API.
//!
//! These tests exercise bookmark storage through the `BookmarkManagerTrait`
//! interface, using an in-memory SQLite database.

use chrono::{TimeZone, Utc};
use fedmarks::database::Database;
use fedmarks::managers::bookmark_manager::{BookmarkManager, BookmarkManagerTrait};
use fedmarks::managers::post_manager::{PostManager, PostRepository};
use fedmarks::managers::profile_manager::ProfileManager;
use fedmarks::services::canonical::url_crc32;
use fedmarks::types::bookmark::SaveOptions;
use fedmarks::types::errors::{BookmarkError, ErrorKind};
use fedmarks::types::post::{PostOrigin, Thumbnail};
use fedmarks::types::profile::{NewProfile, Profile};
use fedmarks::types::settings::SiteSettings;

/// Helper: a fresh in-memory database with one local profile.
fn setup() -> (Database, Profile) {
    let db = Database::open_in_memory().expect("Failed to open in-memory database");
    let profile = ProfileManager::new(db.connection())
        .create(&NewProfile {
            uri: "http://localhost/user/alice".to_string(),
            nickname: "alice".to_string(),
            is_local: true,
            ..NewProfile::default()
        })
        .unwrap();
    (db, profile)
}

fn count(db: &Database, table: &str) -> i64 {
    db.connection()
        .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
        .unwrap()
}

#[test]
fn test_save_new_stores_bookmark_and_post() {
    let (db, profile) = setup();
    let site = SiteSettings::default();
    let mut mgr = BookmarkManager::new(db.connection(), &site);

    let (bookmark, post) = mgr
        .save_new(
            &profile,
            "Example",
            "http://example.com/",
            &["news".to_string()],
            "",
            SaveOptions::default(),
        )
        .unwrap();

    assert_eq!(bookmark.profile_id, profile.id);
    assert_eq!(bookmark.url, "http://example.com/");
    assert_eq!(bookmark.title, "Example");
    assert_eq!(bookmark.uri, post.uri);
    assert_eq!(bookmark.url_crc32, url_crc32("http://example.com/"));
    assert!(bookmark.uri.starts_with(&format!("http://localhost/bookmark/{}/", profile.id)));

    assert_eq!(post.origin, PostOrigin::LocalPublic);
    assert_eq!(post.source, "web");
    assert_eq!(post.content, "\"Example\" http://example.com/ #news");

    let posts = PostManager::new(db.connection());
    assert_eq!(posts.tags(post.id).unwrap(), vec!["news".to_string()]);
    let attachments = posts.attachments(post.id).unwrap();
    assert_eq!(attachments.len(), 1);
    assert_eq!(attachments[0].url, "http://example.com/");

    let fetched = mgr.get_by_profile_url(profile.id, "http://example.com/").unwrap().unwrap();
    assert_eq!(fetched, bookmark);
}

#[test]
fn test_duplicate_is_rejected_and_leaves_one_row() {
    let (db, profile) = setup();
    let site = SiteSettings::default();
    let mut mgr = BookmarkManager::new(db.connection(), &site);

    mgr.save_new(&profile, "Example", "http://example.com/", &[], "", SaveOptions::default())
        .unwrap();
    let err = mgr
        .save_new(&profile, "Again", "http://example.com/", &[], "", SaveOptions::default())
        .unwrap_err();

    assert!(matches!(err, BookmarkError::Duplicate { .. }));
    assert_eq!(err.kind(), ErrorKind::Duplicate);
    assert_eq!(count(&db, "bookmarks"), 1);
    assert_eq!(count(&db, "posts"), 1);
}

#[test]
fn test_unknown_profile_is_a_storage_error_not_a_duplicate() {
    let (db, _) = setup();
    let site = SiteSettings::default();
    let mut mgr = BookmarkManager::new(db.connection(), &site);
    let ghost = Profile {
        id: 999,
        uri: "http://localhost/user/ghost".to_string(),
        nickname: "ghost".to_string(),
        fullname: None,
        profile_url: None,
        is_local: true,
        silenced: false,
    };

    let err = mgr
        .save_new(&ghost, "Example", "http://example.com/", &[], "", SaveOptions::default())
        .unwrap_err();

    assert!(matches!(err, BookmarkError::DatabaseError(_)), "got {:?}", err);
    assert_eq!(err.kind(), ErrorKind::Storage);
    assert_eq!(count(&db, "bookmarks"), 0);
    assert_eq!(count(&db, "posts"), 0);
}

#[test]
fn test_same_url_for_different_profiles_is_allowed() {
    let (db, alice) = setup();
    let bob = ProfileManager::new(db.connection())
        .create(&NewProfile {
            uri: "http://localhost/user/bob".to_string(),
            nickname: "bob".to_string(),
            is_local: true,
            ..NewProfile::default()
        })
        .unwrap();
    let site = SiteSettings::default();
    let mut mgr = BookmarkManager::new(db.connection(), &site);

    mgr.save_new(&alice, "Example", "http://example.com/", &[], "", SaveOptions::default())
        .unwrap();
    mgr.save_new(&bob, "Example", "http://example.com/", &[], "", SaveOptions::default())
        .unwrap();

    assert_eq!(count(&db, "bookmarks"), 2);
    assert_eq!(mgr.post_count_for_url("http://example.com/").unwrap(), 2);
}

#[test]
fn test_post_uri_collision_rolls_back() {
    let (db, profile) = setup();
    let site = SiteSettings::default();
    let mut mgr = BookmarkManager::new(db.connection(), &site);
    let options = SaveOptions {
        uri: Some("http://remote.example/bookmark/1".to_string()),
        ..SaveOptions::default()
    };

    mgr.save_new(&profile, "One", "http://one.example/", &[], "", options.clone())
        .unwrap();
    let err = mgr
        .save_new(&profile, "Two", "http://two.example/", &[], "", options)
        .unwrap_err();

    assert!(matches!(err, BookmarkError::DuplicateUri(_)));
    assert_eq!(count(&db, "bookmarks"), 1);
    assert_eq!(count(&db, "posts"), 1);
    assert_eq!(count(&db, "attachments"), 1);
}

#[test]
fn test_options_are_carried_to_the_post() {
    let (db, profile) = setup();
    let site = SiteSettings::default();
    let mut mgr = BookmarkManager::new(db.connection(), &site);
    let created = Utc.with_ymd_and_hms(2010, 5, 6, 7, 8, 9).unwrap();

    let options = SaveOptions {
        uri: Some("http://remote.example/bookmark/7".to_string()),
        url: Some("http://remote.example/notice/7".to_string()),
        origin: PostOrigin::Remote,
        source: Some("ostatus".to_string()),
        created: Some(created),
        link_title: Some("Example Domain".to_string()),
        thumbnail: Some(Thumbnail {
            url: "http://example.com/t.png".to_string(),
            width: Some(64),
            height: Some(48),
        }),
        ..SaveOptions::default()
    };
    let (bookmark, post) = mgr
        .save_new(&profile, "Example", "http://example.com/", &[], "desc", options)
        .unwrap();

    assert_eq!(bookmark.uri, "http://remote.example/bookmark/7");
    assert_eq!(bookmark.created, created);
    assert_eq!(post.url.as_deref(), Some("http://remote.example/notice/7"));
    assert_eq!(post.origin, PostOrigin::Remote);
    assert_eq!(post.source, "ostatus");
    assert_eq!(post.created, created);

    let attachment = &PostManager::new(db.connection()).attachments(post.id).unwrap()[0];
    assert_eq!(attachment.title.as_deref(), Some("Example Domain"));
    assert_eq!(attachment.thumbnail.as_ref().unwrap().width, Some(64));
}

#[test]
fn test_delete_by_post() {
    let (db, profile) = setup();
    let site = SiteSettings::default();
    let mut mgr = BookmarkManager::new(db.connection(), &site);

    let (_, post) = mgr
        .save_new(&profile, "Example", "http://example.com/", &[], "", SaveOptions::default())
        .unwrap();

    assert!(mgr.delete_by_post(&post).unwrap());
    assert!(mgr.get_by_post(&post).unwrap().is_none());
    assert!(!mgr.delete_by_post(&post).unwrap(), "second delete finds nothing");
}

#[test]
fn test_list_by_profile_newest_first() {
    let (db, profile) = setup();
    let site = SiteSettings::default();
    let mut mgr = BookmarkManager::new(db.connection(), &site);

    for (i, url) in ["http://a.example/", "http://b.example/", "http://c.example/"].iter().enumerate() {
        let options = SaveOptions {
            created: Some(Utc.with_ymd_and_hms(2020, 1, 1 + i as u32, 0, 0, 0).unwrap()),
            ..SaveOptions::default()
        };
        mgr.save_new(&profile, "t", url, &[], "", options).unwrap();
    }

    let page = mgr.list_by_profile(profile.id, 2, 0).unwrap();
    let urls: Vec<&str> = page.iter().map(|b| b.url.as_str()).collect();
    assert_eq!(urls, vec!["http://c.example/", "http://b.example/"]);

    let rest = mgr.list_by_profile(profile.id, 2, 2).unwrap();
    assert_eq!(rest.len(), 1);
    assert_eq!(rest[0].url, "http://a.example/");
}

#[test]
fn test_get_by_uri_missing_is_none() {
    let (db, _) = setup();
    let site = SiteSettings::default();
    let mgr = BookmarkManager::new(db.connection(), &site);
    assert!(mgr.get_by_uri("http://nowhere/bookmark/1").unwrap().is_none());
}
