//! Bookmark store.
//!
//! Implements `BookmarkManagerTrait`: saving a bookmark together with its
//! owning post, lookups by post/URI/owner, and the delete-by-post hook used by
//! the post deletion lifecycle. Backed by SQLite via `rusqlite`.

use chrono::{DateTime, SubsecRound, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::database::{in_transaction, read_sql_date, sql_date};
use crate::managers::post_manager::{PostManager, PostRepository};
use crate::services::canonical::{canonical_tags, escape_html, url_crc32};
use crate::types::bookmark::{source, Bookmark, SaveOptions};
use crate::types::errors::{is_unique_violation, BookmarkError};
use crate::types::post::{NewAttachment, NewPost, Post};
use crate::types::profile::Profile;
use crate::types::settings::SiteSettings;

/// Trait defining bookmark store operations.
pub trait BookmarkManagerTrait {
    /// Saves a new bookmark and its owning post in one transaction.
    /// Fails with `Duplicate` if the profile already bookmarked `url`.
    fn save_new(
        &mut self,
        profile: &Profile,
        title: &str,
        url: &str,
        tags: &[String],
        description: &str,
        options: SaveOptions,
    ) -> Result<(Bookmark, Post), BookmarkError>;
    fn get_by_post(&self, post: &Post) -> Result<Option<Bookmark>, BookmarkError>;
    fn get_by_uri(&self, uri: &str) -> Result<Option<Bookmark>, BookmarkError>;
    fn get_by_profile_url(&self, profile_id: i64, url: &str) -> Result<Option<Bookmark>, BookmarkError>;
    /// Removes the bookmark owned by `post`. Returns whether a row was deleted.
    fn delete_by_post(&mut self, post: &Post) -> Result<bool, BookmarkError>;
    fn list_by_profile(&self, profile_id: i64, limit: i64, offset: i64) -> Result<Vec<Bookmark>, BookmarkError>;
    /// How many posts link to `url`.
    fn post_count_for_url(&self, url: &str) -> Result<i64, BookmarkError>;
}

const BOOKMARK_COLUMNS: &str = "profile_id, url, title, description, uri, url_crc32, created";

/// Bookmark store backed by a SQLite connection.
pub struct BookmarkManager<'a> {
    conn: &'a Connection,
    site_root: String,
}

impl<'a> BookmarkManager<'a> {
    /// Creates a store on `conn`; `site` is used to mint URIs for local
    /// bookmarks.
    pub fn new(conn: &'a Connection, site: &SiteSettings) -> Self {
        Self {
            conn,
            site_root: site.root_url(),
        }
    }

    /// Permalink-style URI for a locally created bookmark.
    pub fn local_uri(site_root: &str, profile_id: i64, created: &DateTime<Utc>, crc: u32) -> String {
        format!(
            "{}/bookmark/{}/{}/{:08x}",
            site_root.trim_end_matches('/'),
            profile_id,
            created.format("%Y%m%d%H%M%S"),
            crc
        )
    }

    /// Plain-text post body: `"title" url description #tag …`.
    fn post_content(title: &str, url: &str, description: &str, tags: &[String]) -> String {
        let quoted = format!("\"{}\"", title);
        let hashtags: Vec<String> = tags.iter().map(|t| format!("#{}", t)).collect();
        [quoted.as_str(), url, description]
            .into_iter()
            .chain(hashtags.iter().map(String::as_str))
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn post_rendered(title: &str, url: &str, description: &str, tags: &[String]) -> String {
        let mut parts = vec![format!(
            "<span class=\"xfolkentry\"><a class=\"taggedlink\" href=\"{}\">{}</a></span>",
            escape_html(url),
            escape_html(title)
        )];
        if !description.is_empty() {
            parts.push(format!("<span class=\"description\">{}</span>", escape_html(description)));
        }
        for tag in tags {
            parts.push(format!("<span class=\"tag\">#{}</span>", escape_html(tag)));
        }
        parts.join(" ")
    }

    fn row_to_bookmark(row: &rusqlite::Row) -> rusqlite::Result<Bookmark> {
        Ok(Bookmark {
            profile_id: row.get(0)?,
            url: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            uri: row.get(4)?,
            url_crc32: row.get(5)?,
            created: read_sql_date(row, 6)?,
        })
    }

    fn insert_bookmark(conn: &Connection, bookmark: &Bookmark) -> Result<(), BookmarkError> {
        conn.execute(
            "INSERT INTO bookmarks (profile_id, url, title, description, uri, url_crc32, created) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                bookmark.profile_id,
                bookmark.url,
                bookmark.title,
                bookmark.description,
                bookmark.uri,
                bookmark.url_crc32,
                sql_date(&bookmark.created),
            ],
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                BookmarkError::Duplicate {
                    profile_id: bookmark.profile_id,
                    url: bookmark.url.clone(),
                }
            } else {
                BookmarkError::DatabaseError(e.to_string())
            }
        })?;
        Ok(())
    }
}

impl<'a> BookmarkManagerTrait for BookmarkManager<'a> {
    fn save_new(
        &mut self,
        profile: &Profile,
        title: &str,
        url: &str,
        tags: &[String],
        description: &str,
        options: SaveOptions,
    ) -> Result<(Bookmark, Post), BookmarkError> {
        if self.get_by_profile_url(profile.id, url)?.is_some() {
            info!(profile_id = profile.id, url, "rejecting duplicate bookmark");
            return Err(BookmarkError::Duplicate {
                profile_id: profile.id,
                url: url.to_string(),
            });
        }

        let crc = url_crc32(url);
        let created = options.created.unwrap_or_else(Utc::now).trunc_subsecs(0);
        let uri = options
            .uri
            .clone()
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| Self::local_uri(&self.site_root, profile.id, &created, crc));
        let tags = canonical_tags(tags.iter().map(String::as_str));

        let bookmark = Bookmark {
            profile_id: profile.id,
            url: url.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            uri: uri.clone(),
            url_crc32: crc,
            created,
        };

        let new_post = NewPost {
            uri,
            profile_id: profile.id,
            content: Self::post_content(title, url, description, &tags),
            rendered: Self::post_rendered(title, url, description, &tags),
            url: options.url.clone(),
            origin: options.origin,
            source: options.source.clone().unwrap_or_else(|| source::WEB.to_string()),
            created,
            location: options.location.clone(),
            reply_to: options.reply_to,
            tags,
            reply_profile_ids: options.replies.clone(),
            group_ids: options.groups.clone(),
            attachment: Some(NewAttachment {
                url: url.to_string(),
                title: options.link_title.clone(),
                thumbnail: options.thumbnail.clone(),
            }),
        };

        let post = in_transaction(self.conn, |conn| {
            let post = PostManager::new(conn).create_post(&new_post)?;
            Self::insert_bookmark(conn, &bookmark)?;
            Ok::<_, BookmarkError>(post)
        })?;

        debug!(uri = %bookmark.uri, post_id = post.id, "saved bookmark");
        Ok((bookmark, post))
    }

    fn get_by_post(&self, post: &Post) -> Result<Option<Bookmark>, BookmarkError> {
        self.get_by_uri(&post.uri)
    }

    fn get_by_uri(&self, uri: &str) -> Result<Option<Bookmark>, BookmarkError> {
        let sql = format!("SELECT {} FROM bookmarks WHERE uri = ?1", BOOKMARK_COLUMNS);
        Ok(self
            .conn
            .query_row(&sql, params![uri], Self::row_to_bookmark)
            .optional()?)
    }

    fn get_by_profile_url(&self, profile_id: i64, url: &str) -> Result<Option<Bookmark>, BookmarkError> {
        let sql = format!(
            "SELECT {} FROM bookmarks WHERE profile_id = ?1 AND url_crc32 = ?2 AND url = ?3",
            BOOKMARK_COLUMNS
        );
        Ok(self
            .conn
            .query_row(&sql, params![profile_id, url_crc32(url), url], Self::row_to_bookmark)
            .optional()?)
    }

    fn delete_by_post(&mut self, post: &Post) -> Result<bool, BookmarkError> {
        let affected = self
            .conn
            .execute("DELETE FROM bookmarks WHERE uri = ?1", params![post.uri])?;
        if affected > 0 {
            info!(uri = %post.uri, "deleted bookmark for removed post");
        }
        Ok(affected > 0)
    }

    fn list_by_profile(&self, profile_id: i64, limit: i64, offset: i64) -> Result<Vec<Bookmark>, BookmarkError> {
        let sql = format!(
            "SELECT {} FROM bookmarks WHERE profile_id = ?1 ORDER BY created DESC, uri LIMIT ?2 OFFSET ?3",
            BOOKMARK_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![profile_id, limit, offset], Self::row_to_bookmark)?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    fn post_count_for_url(&self, url: &str) -> Result<i64, BookmarkError> {
        Ok(PostManager::new(self.conn).count_for_url(url)?)
    }
}
