//! Profile store.
//!
//! Implements `ProfileRepository`: the lookups the ingestion pipeline needs
//! to resolve actors and addressees, plus materialization of federated
//! placeholder profiles. Backed by SQLite via `rusqlite`.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;
use url::Url;
use uuid::Uuid;

use crate::database::sql_date;
use crate::types::activity::ActivityObject;
use crate::types::errors::RepositoryError;
use crate::types::profile::{NewProfile, Profile};

/// Lookup/create operations on profiles.
pub trait ProfileRepository {
    fn get_by_id(&self, id: i64) -> Result<Option<Profile>, RepositoryError>;
    fn find_by_uri(&self, uri: &str) -> Result<Option<Profile>, RepositoryError>;
    /// Returns the profile for a remote actor, creating a federated
    /// placeholder if none is stored yet.
    fn ensure_remote_profile(&self, actor: &ActivityObject) -> Result<Profile, RepositoryError>;
}

const PROFILE_COLUMNS: &str = "id, uri, nickname, fullname, profile_url, is_local, silenced";

/// Profile store backed by a SQLite connection.
pub struct ProfileManager<'a> {
    conn: &'a Connection,
}

impl<'a> ProfileManager<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Inserts a new profile and returns it.
    pub fn create(&self, profile: &NewProfile) -> Result<Profile, RepositoryError> {
        self.conn.execute(
            "INSERT INTO profiles (uri, nickname, fullname, profile_url, is_local, silenced, created) \
             VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6)",
            params![
                profile.uri,
                profile.nickname,
                profile.fullname,
                profile.profile_url,
                profile.is_local,
                sql_date(&Utc::now()),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_by_id(id)?
            .ok_or_else(|| RepositoryError::NotFound(format!("profile {}", id)))
    }

    /// Looks up a local profile by nickname.
    pub fn find_local_by_nickname(&self, nickname: &str) -> Result<Option<Profile>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM profiles WHERE nickname = ?1 AND is_local = 1",
            PROFILE_COLUMNS
        );
        Ok(self
            .conn
            .query_row(&sql, params![nickname], Self::row_to_profile)
            .optional()?)
    }

    pub fn set_silenced(&self, id: i64, silenced: bool) -> Result<(), RepositoryError> {
        let affected = self.conn.execute(
            "UPDATE profiles SET silenced = ?1 WHERE id = ?2",
            params![silenced, id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound(format!("profile {}", id)));
        }
        Ok(())
    }

    fn row_to_profile(row: &rusqlite::Row) -> rusqlite::Result<Profile> {
        Ok(Profile {
            id: row.get(0)?,
            uri: row.get(1)?,
            nickname: row.get(2)?,
            fullname: row.get(3)?,
            profile_url: row.get(4)?,
            is_local: row.get(5)?,
            silenced: row.get(6)?,
        })
    }

    /// Picks a nickname for a remote actor: the last path segment of its
    /// profile or id URL, else the host, else a random one.
    fn derive_nickname(actor: &ActivityObject, uri: &str) -> String {
        let candidates = actor.link.iter().map(String::as_str).chain(std::iter::once(uri));
        for candidate in candidates {
            let Ok(parsed) = Url::parse(candidate) else {
                continue;
            };
            let segment = parsed
                .path_segments()
                .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
                .map(|s| s.trim_start_matches('@').to_string());
            if let Some(segment) = segment.filter(|s| !s.is_empty()) {
                return segment;
            }
            if let Some(host) = parsed.host_str() {
                return host.to_string();
            }
        }
        format!("remote{}", &Uuid::new_v4().simple().to_string()[..8])
    }
}

impl<'a> ProfileRepository for ProfileManager<'a> {
    fn get_by_id(&self, id: i64) -> Result<Option<Profile>, RepositoryError> {
        let sql = format!("SELECT {} FROM profiles WHERE id = ?1", PROFILE_COLUMNS);
        Ok(self
            .conn
            .query_row(&sql, params![id], Self::row_to_profile)
            .optional()?)
    }

    fn find_by_uri(&self, uri: &str) -> Result<Option<Profile>, RepositoryError> {
        let sql = format!("SELECT {} FROM profiles WHERE uri = ?1", PROFILE_COLUMNS);
        Ok(self
            .conn
            .query_row(&sql, params![uri], Self::row_to_profile)
            .optional()?)
    }

    fn ensure_remote_profile(&self, actor: &ActivityObject) -> Result<Profile, RepositoryError> {
        let uri = actor
            .id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| RepositoryError::NotFound("actor id".to_string()))?;

        if let Some(existing) = self.find_by_uri(uri)? {
            return Ok(existing);
        }

        let nickname = Self::derive_nickname(actor, uri);
        info!(uri, nickname = %nickname, "creating federated profile placeholder");
        self.create(&NewProfile {
            uri: uri.to_string(),
            nickname,
            fullname: actor.title.clone(),
            profile_url: actor.link.clone(),
            is_local: false,
        })
    }
}
