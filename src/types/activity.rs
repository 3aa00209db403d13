//! Federation activity shape, used both for inbound deliveries and for
//! re-federating stored bookmarks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Base IRI for Activity Streams 1.0 verbs and object types.
pub const SCHEMA_BASE: &str = "http://activitystrea.ms/schema/1.0/";

pub const VERB_POST: &str = "http://activitystrea.ms/schema/1.0/post";

pub const OBJECT_BOOKMARK: &str = "http://activitystrea.ms/schema/1.0/bookmark";
pub const OBJECT_PERSON: &str = "http://activitystrea.ms/schema/1.0/person";
pub const OBJECT_GROUP: &str = "http://activitystrea.ms/schema/1.0/group";

pub const REL_RELATED: &str = "related";
pub const REL_PREVIEW: &str = "preview";

/// Returns true if `value` names the schema term `term`, either in short
/// form (`"post"`) or as the full schema IRI.
pub fn is_schema_term(value: &str, term: &str) -> bool {
    value == term
        || value
            .strip_prefix(SCHEMA_BASE)
            .is_some_and(|rest| rest == term)
}

/// An actor performing a verb on one or more objects.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Activity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub verb: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<ActivityObject>,
    #[serde(default)]
    pub objects: Vec<ActivityObject>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub context: ActivityContext,
}

impl Activity {
    /// The primary object of the activity, if any.
    pub fn first_object(&self) -> Option<&ActivityObject> {
        self.objects.first()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ActivityObject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub object_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Canonical (human-facing) URL of the object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    /// Embedded `<link>` elements.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
}

impl ActivityObject {
    /// All embedded links with the given `rel`, in document order.
    pub fn links_with_rel(&self, rel: &str) -> Vec<&Link> {
        self.links.iter().filter(|l| l.rel == rel).collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Link {
    pub rel: String,
    pub href: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(
        default,
        rename = "media:width",
        skip_serializing_if = "Option::is_none"
    )]
    pub media_width: Option<u32>,
    #[serde(
        default,
        rename = "media:height",
        skip_serializing_if = "Option::is_none"
    )]
    pub media_height: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub term: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Addressing and placement information carried alongside the activity.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ActivityContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<ActivityLocation>,
    /// URIs of profiles and groups the activity is addressed to.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attention: Vec<String>,
    #[serde(
        default,
        rename = "replyToID",
        skip_serializing_if = "Option::is_none"
    )]
    pub reply_to_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ActivityLocation {
    pub lat: f64,
    pub lon: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_ns: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_id: Option<String>,
}
