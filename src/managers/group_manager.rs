//! Group store: resolves addressed group URIs.

use rusqlite::{params, Connection, OptionalExtension};

use crate::types::errors::RepositoryError;
use crate::types::profile::UserGroup;

pub trait GroupRepository {
    fn get_by_id(&self, id: i64) -> Result<Option<UserGroup>, RepositoryError>;
    fn find_by_uri(&self, uri: &str) -> Result<Option<UserGroup>, RepositoryError>;
}

/// Group store backed by a SQLite connection.
pub struct GroupManager<'a> {
    conn: &'a Connection,
}

impl<'a> GroupManager<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn create(
        &self,
        uri: &str,
        nickname: &str,
        fullname: Option<&str>,
        is_local: bool,
    ) -> Result<UserGroup, RepositoryError> {
        self.conn.execute(
            "INSERT INTO user_groups (uri, nickname, fullname, is_local) VALUES (?1, ?2, ?3, ?4)",
            params![uri, nickname, fullname, is_local],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_by_id(id)?
            .ok_or_else(|| RepositoryError::NotFound(format!("group {}", id)))
    }

    fn row_to_group(row: &rusqlite::Row) -> rusqlite::Result<UserGroup> {
        Ok(UserGroup {
            id: row.get(0)?,
            uri: row.get(1)?,
            nickname: row.get(2)?,
            fullname: row.get(3)?,
            is_local: row.get(4)?,
        })
    }
}

impl<'a> GroupRepository for GroupManager<'a> {
    fn get_by_id(&self, id: i64) -> Result<Option<UserGroup>, RepositoryError> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, uri, nickname, fullname, is_local FROM user_groups WHERE id = ?1",
                params![id],
                Self::row_to_group,
            )
            .optional()?)
    }

    fn find_by_uri(&self, uri: &str) -> Result<Option<UserGroup>, RepositoryError> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, uri, nickname, fullname, is_local FROM user_groups WHERE uri = ?1",
                params![uri],
                Self::row_to_group,
            )
            .optional()?)
    }
}
