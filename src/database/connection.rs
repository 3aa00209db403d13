//! SQLite connection management for fedmarks.
//!
//! Provides the [`Database`] struct that wraps a `rusqlite::Connection`
//! and runs schema migrations on open, plus the transaction and date
//! helpers shared by the managers.

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, Row};
use std::path::Path;

use super::migrations;

/// Storage format for timestamps.
pub const SQL_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Database wrapper owning the single connection used by a request.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens (or creates) a SQLite database at the given file path and runs migrations.
    ///
    /// # Errors
    /// Returns `rusqlite::Error` if the connection cannot be established or migrations fail.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, rusqlite::Error> {
        let conn = Connection::open(path)?;
        migrations::run_all(&conn)?;
        Ok(Self { conn })
    }

    /// Opens an in-memory SQLite database and runs migrations.
    pub fn open_in_memory() -> Result<Self, rusqlite::Error> {
        let conn = Connection::open_in_memory()?;
        migrations::run_all(&conn)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Runs `f` inside a transaction on this connection. See [`in_transaction`].
    pub fn in_transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Connection) -> Result<T, E>,
        E: From<rusqlite::Error>,
    {
        in_transaction(&self.conn, f)
    }
}

/// Runs `f` inside a transaction, committing if it returns `Ok` and rolling
/// back otherwise.
///
/// If the connection is already inside a transaction, `f` joins it and the
/// outer caller decides whether to commit.
pub fn in_transaction<T, E, F>(conn: &Connection, f: F) -> Result<T, E>
where
    F: FnOnce(&Connection) -> Result<T, E>,
    E: From<rusqlite::Error>,
{
    if !conn.is_autocommit() {
        return f(conn);
    }
    let tx = conn.unchecked_transaction()?;
    let value = f(&tx)?;
    tx.commit()?;
    Ok(value)
}

/// Formats a timestamp in storage format (second precision, UTC).
pub fn sql_date(time: &DateTime<Utc>) -> String {
    time.format(SQL_DATE_FORMAT).to_string()
}

/// Parses a storage-format timestamp.
pub fn parse_sql_date(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    NaiveDateTime::parse_from_str(value, SQL_DATE_FORMAT).map(|naive| naive.and_utc())
}

/// Reads a storage-format timestamp column.
pub fn read_sql_date(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_sql_date(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
