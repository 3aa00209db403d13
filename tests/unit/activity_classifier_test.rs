//! Unit tests for recognizing "post a bookmark" activities.

use fedmarks::services::activity_classifier::is_post_bookmark;
use fedmarks::types::activity::{Activity, ActivityObject};
use rstest::rstest;

fn activity(verb: &str, object_types: &[&str]) -> Activity {
    Activity {
        verb: verb.to_string(),
        objects: object_types
            .iter()
            .map(|t| ActivityObject {
                object_type: t.to_string(),
                ..ActivityObject::default()
            })
            .collect(),
        ..Activity::default()
    }
}

#[rstest]
#[case("post", &["bookmark"], true)]
#[case("http://activitystrea.ms/schema/1.0/post", &["http://activitystrea.ms/schema/1.0/bookmark"], true)]
#[case("post", &["http://activitystrea.ms/schema/1.0/bookmark"], true)]
#[case("post", &["bookmark", "note"], true)]
#[case("post", &["note"], false)]
#[case("post", &["note", "bookmark"], false)]
#[case("favorite", &["bookmark"], false)]
#[case("share", &["bookmark"], false)]
#[case("post", &[], false)]
#[case("http://example.com/schema/post", &["bookmark"], false)]
fn test_classification(#[case] verb: &str, #[case] objects: &[&str], #[case] expected: bool) {
    assert_eq!(is_post_bookmark(&activity(verb, objects)), expected);
}

#[test]
fn test_classifies_parsed_json() {
    let json = r#"{
        "verb": "http://activitystrea.ms/schema/1.0/post",
        "objects": [{"type": "http://activitystrea.ms/schema/1.0/bookmark"}]
    }"#;
    let parsed: Activity = serde_json::from_str(json).unwrap();
    assert!(is_post_bookmark(&parsed));
}
