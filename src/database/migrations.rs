//! Schema migrations for the fedmarks SQLite database.
//!
//! Uses a `schema_version` table to track which migrations have been applied.
//! Each migration runs exactly once and is recorded with a timestamp.

use rusqlite::Connection;

/// Current schema version. Bump this when adding a new migration.
pub const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Returns the current schema version from the database (0 if table doesn't exist).
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .unwrap_or(0)
}

/// Runs all pending schema migrations against the provided connection.
///
/// # Errors
/// Returns `rusqlite::Error` if any SQL statement fails.
pub fn run_all(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA foreign_keys = ON;
         CREATE TABLE IF NOT EXISTS schema_version (
             version INTEGER PRIMARY KEY,
             applied_at INTEGER NOT NULL,
             description TEXT NOT NULL
         );",
    )?;

    let current = get_schema_version(conn);

    if current < 1 {
        migration_v1(conn)?;
        record_version(conn, 1, "Profiles, groups, posts and attachments")?;
    }

    if current < 2 {
        migration_v2(conn)?;
        record_version(conn, 2, "Bookmark table with checksum index")?;
    }

    Ok(())
}

fn record_version(conn: &Connection, version: i32, description: &str) -> Result<(), rusqlite::Error> {
    let now = chrono::Utc::now().timestamp();
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version, applied_at, description) VALUES (?1, ?2, ?3)",
        rusqlite::params![version, now, description],
    )?;
    Ok(())
}

/// V1: the host-side entities bookmarks hang off.
fn migration_v1(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS profiles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            uri TEXT NOT NULL UNIQUE,
            nickname TEXT NOT NULL,
            fullname TEXT,
            profile_url TEXT,
            is_local INTEGER NOT NULL DEFAULT 0,
            silenced INTEGER NOT NULL DEFAULT 0,
            created TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS user_groups (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            uri TEXT NOT NULL UNIQUE,
            nickname TEXT NOT NULL,
            fullname TEXT,
            is_local INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS posts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            uri TEXT NOT NULL UNIQUE,
            profile_id INTEGER NOT NULL,
            content TEXT NOT NULL,
            rendered TEXT NOT NULL,
            url TEXT,
            is_local INTEGER NOT NULL DEFAULT 1,
            source TEXT NOT NULL,
            created TEXT NOT NULL,
            lat REAL,
            lon REAL,
            location_ns INTEGER,
            location_id TEXT,
            reply_to INTEGER,
            FOREIGN KEY (profile_id) REFERENCES profiles(id),
            FOREIGN KEY (reply_to) REFERENCES posts(id) ON DELETE SET NULL
        );

        CREATE INDEX IF NOT EXISTS idx_posts_profile_created ON posts(profile_id, created);

        CREATE TABLE IF NOT EXISTS post_tags (
            post_id INTEGER NOT NULL,
            tag TEXT NOT NULL,
            PRIMARY KEY (post_id, tag),
            FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS post_replies (
            post_id INTEGER NOT NULL,
            profile_id INTEGER NOT NULL,
            PRIMARY KEY (post_id, profile_id),
            FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE,
            FOREIGN KEY (profile_id) REFERENCES profiles(id)
        );

        CREATE TABLE IF NOT EXISTS group_inbox (
            group_id INTEGER NOT NULL,
            post_id INTEGER NOT NULL,
            PRIMARY KEY (group_id, post_id),
            FOREIGN KEY (group_id) REFERENCES user_groups(id),
            FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS attachments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            post_id INTEGER NOT NULL,
            url TEXT NOT NULL,
            title TEXT,
            thumb_url TEXT,
            thumb_width INTEGER,
            thumb_height INTEGER,
            FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_attachments_url ON attachments(url);
        CREATE INDEX IF NOT EXISTS idx_attachments_post ON attachments(post_id);
        ",
    )
}

/// V2: bookmarks, unique per (profile, url), with a checksum index for
/// duplicate lookups on long URLs.
fn migration_v2(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS bookmarks (
            profile_id INTEGER NOT NULL,
            url TEXT NOT NULL,
            title TEXT NOT NULL DEFAULT '',
            description TEXT NOT NULL DEFAULT '',
            uri TEXT NOT NULL UNIQUE,
            url_crc32 INTEGER NOT NULL,
            created TEXT NOT NULL,
            PRIMARY KEY (profile_id, url),
            FOREIGN KEY (profile_id) REFERENCES profiles(id)
        );

        CREATE INDEX IF NOT EXISTS bookmark_profile_url_idx ON bookmarks(profile_id, url_crc32);
        CREATE INDEX IF NOT EXISTS idx_bookmarks_url_crc32 ON bookmarks(url_crc32);
        CREATE INDEX IF NOT EXISTS idx_bookmarks_created ON bookmarks(created);
        ",
    )
}
