//! Post store.
//!
//! Implements `PostRepository` over the `posts`, `post_tags`, `post_replies`,
//! `group_inbox` and `attachments` tables. None of these methods opens a
//! transaction; callers that need atomicity wrap them with
//! [`crate::database::in_transaction`].

use rusqlite::{params, Connection, OptionalExtension};

use crate::database::{read_sql_date, sql_date};
use crate::types::errors::RepositoryError;
use crate::types::post::{Attachment, GeoPoint, NewPost, Post, PostOrigin, Thumbnail};

/// Lookup/create/delete operations on posts.
pub trait PostRepository {
    fn get_by_id(&self, id: i64) -> Result<Option<Post>, RepositoryError>;
    fn find_by_uri(&self, uri: &str) -> Result<Option<Post>, RepositoryError>;
    /// Inserts the post with its tags, addressing and attachment.
    fn create_post(&self, post: &NewPost) -> Result<Post, RepositoryError>;
    /// Deletes the post and its dependent rows.
    fn delete_post(&self, id: i64) -> Result<(), RepositoryError>;
    fn attachments(&self, post_id: i64) -> Result<Vec<Attachment>, RepositoryError>;
    fn tags(&self, post_id: i64) -> Result<Vec<String>, RepositoryError>;
    fn reply_profile_ids(&self, post_id: i64) -> Result<Vec<i64>, RepositoryError>;
    fn group_ids(&self, post_id: i64) -> Result<Vec<i64>, RepositoryError>;
}

const POST_COLUMNS: &str = "id, uri, profile_id, content, rendered, url, is_local, source, created, \
                            lat, lon, location_ns, location_id, reply_to";

/// Post store backed by a SQLite connection.
pub struct PostManager<'a> {
    conn: &'a Connection,
}

impl<'a> PostManager<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Number of posts with an attachment pointing at `url`.
    pub fn count_for_url(&self, url: &str) -> Result<i64, RepositoryError> {
        Ok(self.conn.query_row(
            "SELECT COUNT(DISTINCT post_id) FROM attachments WHERE url = ?1",
            params![url],
            |row| row.get(0),
        )?)
    }

    fn row_to_post(row: &rusqlite::Row) -> rusqlite::Result<Post> {
        let origin_code: i32 = row.get(6)?;
        let lat: Option<f64> = row.get(9)?;
        let lon: Option<f64> = row.get(10)?;
        let location = match (lat, lon) {
            (Some(lat), Some(lon)) => Some(GeoPoint {
                lat,
                lon,
                location_ns: row.get(11)?,
                location_id: row.get(12)?,
            }),
            _ => None,
        };
        Ok(Post {
            id: row.get(0)?,
            uri: row.get(1)?,
            profile_id: row.get(2)?,
            content: row.get(3)?,
            rendered: row.get(4)?,
            url: row.get(5)?,
            origin: PostOrigin::from_code(origin_code).unwrap_or(PostOrigin::Remote),
            source: row.get(7)?,
            created: read_sql_date(row, 8)?,
            location,
            reply_to: row.get(13)?,
        })
    }

    fn row_to_attachment(row: &rusqlite::Row) -> rusqlite::Result<Attachment> {
        let thumb_url: Option<String> = row.get(4)?;
        let thumbnail = match thumb_url {
            Some(url) => Some(Thumbnail {
                url,
                width: row.get(5)?,
                height: row.get(6)?,
            }),
            None => None,
        };
        Ok(Attachment {
            id: row.get(0)?,
            post_id: row.get(1)?,
            url: row.get(2)?,
            title: row.get(3)?,
            thumbnail,
        })
    }

    fn collect_ids(&self, sql: &str, post_id: i64) -> Result<Vec<i64>, RepositoryError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params![post_id], |row| row.get(0))?;
        let mut ids = Vec::new();
        for row in rows {
            ids.push(row?);
        }
        Ok(ids)
    }
}

impl<'a> PostRepository for PostManager<'a> {
    fn get_by_id(&self, id: i64) -> Result<Option<Post>, RepositoryError> {
        let sql = format!("SELECT {} FROM posts WHERE id = ?1", POST_COLUMNS);
        Ok(self
            .conn
            .query_row(&sql, params![id], Self::row_to_post)
            .optional()?)
    }

    fn find_by_uri(&self, uri: &str) -> Result<Option<Post>, RepositoryError> {
        let sql = format!("SELECT {} FROM posts WHERE uri = ?1", POST_COLUMNS);
        Ok(self
            .conn
            .query_row(&sql, params![uri], Self::row_to_post)
            .optional()?)
    }

    fn create_post(&self, post: &NewPost) -> Result<Post, RepositoryError> {
        let (lat, lon, location_ns, location_id) = match &post.location {
            Some(geo) => (Some(geo.lat), Some(geo.lon), geo.location_ns, geo.location_id.clone()),
            None => (None, None, None, None),
        };

        self.conn
            .execute(
                "INSERT INTO posts (uri, profile_id, content, rendered, url, is_local, source, created, \
                 lat, lon, location_ns, location_id, reply_to) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    post.uri,
                    post.profile_id,
                    post.content,
                    post.rendered,
                    post.url,
                    post.origin.code(),
                    post.source,
                    sql_date(&post.created),
                    lat,
                    lon,
                    location_ns,
                    location_id,
                    post.reply_to,
                ],
            )
            .map_err(|e| match RepositoryError::from(e) {
                RepositoryError::Conflict(_) => RepositoryError::Conflict(post.uri.clone()),
                other => other,
            })?;
        let id = self.conn.last_insert_rowid();

        for tag in &post.tags {
            self.conn.execute(
                "INSERT OR IGNORE INTO post_tags (post_id, tag) VALUES (?1, ?2)",
                params![id, tag],
            )?;
        }
        for profile_id in &post.reply_profile_ids {
            self.conn.execute(
                "INSERT OR IGNORE INTO post_replies (post_id, profile_id) VALUES (?1, ?2)",
                params![id, profile_id],
            )?;
        }
        for group_id in &post.group_ids {
            self.conn.execute(
                "INSERT OR IGNORE INTO group_inbox (group_id, post_id) VALUES (?1, ?2)",
                params![group_id, id],
            )?;
        }
        if let Some(attachment) = &post.attachment {
            let thumb = attachment.thumbnail.as_ref();
            self.conn.execute(
                "INSERT INTO attachments (post_id, url, title, thumb_url, thumb_width, thumb_height) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    id,
                    attachment.url,
                    attachment.title,
                    thumb.map(|t| t.url.as_str()),
                    thumb.and_then(|t| t.width),
                    thumb.and_then(|t| t.height),
                ],
            )?;
        }

        self.get_by_id(id)?
            .ok_or_else(|| RepositoryError::NotFound(format!("post {}", id)))
    }

    fn delete_post(&self, id: i64) -> Result<(), RepositoryError> {
        // Dependent rows go via ON DELETE CASCADE.
        let affected = self
            .conn
            .execute("DELETE FROM posts WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(RepositoryError::NotFound(format!("post {}", id)));
        }
        Ok(())
    }

    fn attachments(&self, post_id: i64) -> Result<Vec<Attachment>, RepositoryError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, post_id, url, title, thumb_url, thumb_width, thumb_height \
             FROM attachments WHERE post_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![post_id], Self::row_to_attachment)?;
        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    fn tags(&self, post_id: i64) -> Result<Vec<String>, RepositoryError> {
        let mut stmt = self
            .conn
            .prepare("SELECT tag FROM post_tags WHERE post_id = ?1 ORDER BY tag")?;
        let rows = stmt.query_map(params![post_id], |row| row.get(0))?;
        let mut tags = Vec::new();
        for row in rows {
            tags.push(row?);
        }
        Ok(tags)
    }

    fn reply_profile_ids(&self, post_id: i64) -> Result<Vec<i64>, RepositoryError> {
        self.collect_ids(
            "SELECT profile_id FROM post_replies WHERE post_id = ?1 ORDER BY profile_id",
            post_id,
        )
    }

    fn group_ids(&self, post_id: i64) -> Result<Vec<i64>, RepositoryError> {
        self.collect_ids(
            "SELECT group_id FROM group_inbox WHERE post_id = ?1 ORDER BY group_id",
            post_id,
        )
    }
}
