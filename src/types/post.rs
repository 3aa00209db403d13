use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a post originated. Stored as the integer code in `posts.is_local`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum PostOrigin {
    #[default]
    LocalPublic,
    LocalNonPublic,
    Remote,
    Gateway,
}

impl PostOrigin {
    pub fn code(self) -> i32 {
        match self {
            PostOrigin::LocalPublic => 1,
            PostOrigin::Remote => 0,
            PostOrigin::LocalNonPublic => -1,
            PostOrigin::Gateway => -2,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(PostOrigin::LocalPublic),
            0 => Some(PostOrigin::Remote),
            -1 => Some(PostOrigin::LocalNonPublic),
            -2 => Some(PostOrigin::Gateway),
            _ => None,
        }
    }

    pub fn is_local(self) -> bool {
        matches!(self, PostOrigin::LocalPublic | PostOrigin::LocalNonPublic)
    }
}

/// Latitude/longitude with an optional reference into a named-location
/// namespace.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
    pub location_ns: Option<i64>,
    pub location_id: Option<String>,
}

/// A stored post.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Post {
    pub id: i64,
    pub uri: String,
    pub profile_id: i64,
    pub content: String,
    pub rendered: String,
    /// Canonical URL supplied by the origin server, if any.
    pub url: Option<String>,
    pub origin: PostOrigin,
    pub source: String,
    pub created: DateTime<Utc>,
    pub location: Option<GeoPoint>,
    pub reply_to: Option<i64>,
}

impl Post {
    /// The post's canonical URL: the origin-supplied one, or the local
    /// permalink under `site_root`.
    pub fn best_url(&self, site_root: &str) -> String {
        match self.url.as_deref() {
            Some(url) if !url.is_empty() => url.to_string(),
            _ => format!("{}/notice/{}", site_root.trim_end_matches('/'), self.id),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Thumbnail {
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// An external resource linked from a post.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Attachment {
    pub id: i64,
    pub post_id: i64,
    pub url: String,
    pub title: Option<String>,
    pub thumbnail: Option<Thumbnail>,
}

#[derive(Debug, Clone, Default)]
pub struct NewAttachment {
    pub url: String,
    pub title: Option<String>,
    pub thumbnail: Option<Thumbnail>,
}

/// Everything needed to insert a post with its tags, addressing and
/// attachment.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub uri: String,
    pub profile_id: i64,
    pub content: String,
    pub rendered: String,
    pub url: Option<String>,
    pub origin: PostOrigin,
    pub source: String,
    pub created: DateTime<Utc>,
    pub location: Option<GeoPoint>,
    pub reply_to: Option<i64>,
    pub tags: Vec<String>,
    pub reply_profile_ids: Vec<i64>,
    pub group_ids: Vec<i64>,
    pub attachment: Option<NewAttachment>,
}
