use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::post::{GeoPoint, PostOrigin, Thumbnail};

/// Provenance tags recorded in `posts.source`.
pub mod source {
    pub const WEB: &str = "web";
    pub const ATOMPUB: &str = "atompub";
    pub const RESTORE: &str = "restore";
    pub const OSTATUS: &str = "ostatus";
    pub const DELICIOUS: &str = "delicious";
}

/// A saved bookmark. Linked to its owning post by `uri`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bookmark {
    pub profile_id: i64,
    pub url: String,
    pub title: String,
    pub description: String,
    pub uri: String,
    pub url_crc32: u32,
    pub created: DateTime<Utc>,
}

/// Optional parameters for saving a bookmark.
#[derive(Debug, Clone, Default)]
pub struct SaveOptions {
    /// Globally unique id; minted locally when absent.
    pub uri: Option<String>,
    /// Canonical URL of the owning post.
    pub url: Option<String>,
    pub origin: PostOrigin,
    /// Provenance tag, see [`source`]. Defaults to `"web"`.
    pub source: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub location: Option<GeoPoint>,
    /// Group ids the post is addressed to.
    pub groups: Vec<i64>,
    /// Profile ids the post is addressed to.
    pub replies: Vec<i64>,
    /// Id of the post this one directly replies to.
    pub reply_to: Option<i64>,
    /// Title of the linked page, when known.
    pub link_title: Option<String>,
    pub thumbnail: Option<Thumbnail>,
}
