use rusqlite::ffi;
use thiserror::Error;

/// Coarse classification of pipeline failures, used by transports to decide
/// how to answer the delivering server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or misaddressed activity; reject the delivery.
    ClientInput,
    /// The sending actor could not be established or verified.
    Authorship,
    /// The bookmark (or its post URI) is already stored.
    Duplicate,
    /// Persistence failure; fatal for this request only.
    Storage,
}

/// Returns true only for UNIQUE and PRIMARY KEY violations. Foreign key,
/// NOT NULL and CHECK failures are storage errors, not duplicates.
pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
                || e.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

// === BookmarkError ===

/// Errors raised while ingesting, storing or rendering bookmarks.
#[derive(Debug, Error)]
pub enum BookmarkError {
    #[error("Activity has no object")]
    MissingObject,
    #[error("Expected exactly 1 link rel=related in a Bookmark")]
    MissingTargetLink,
    #[error("Invalid bookmark target link: {0}")]
    InvalidTargetLink(String),
    #[error("Bookmark post {post_uri} has {count} attachments, expected exactly 1")]
    AttachmentCount { post_uri: String, count: usize },
    #[error("{0}")]
    NotAddressed(String),
    #[error("Can't get author for activity: {0}")]
    Authorship(String),
    #[error("Bookmark already exists for profile {profile_id}: {url}")]
    Duplicate { profile_id: i64, url: String },
    #[error("Post URI already in use: {0}")]
    DuplicateUri(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bookmark database error: {0}")]
    DatabaseError(String),
}

impl BookmarkError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BookmarkError::MissingObject
            | BookmarkError::MissingTargetLink
            | BookmarkError::InvalidTargetLink(_)
            | BookmarkError::AttachmentCount { .. }
            | BookmarkError::NotAddressed(_)
            | BookmarkError::NotFound(_) => ErrorKind::ClientInput,
            BookmarkError::Authorship(_) => ErrorKind::Authorship,
            BookmarkError::Duplicate { .. } | BookmarkError::DuplicateUri(_) => {
                ErrorKind::Duplicate
            }
            BookmarkError::DatabaseError(_) => ErrorKind::Storage,
        }
    }
}

impl From<rusqlite::Error> for BookmarkError {
    fn from(err: rusqlite::Error) -> Self {
        BookmarkError::DatabaseError(err.to_string())
    }
}

impl From<RepositoryError> for BookmarkError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(what) => BookmarkError::NotFound(what),
            RepositoryError::Conflict(what) => BookmarkError::DuplicateUri(what),
            RepositoryError::DatabaseError(msg) => BookmarkError::DatabaseError(msg),
        }
    }
}

// === RepositoryError ===

/// Errors from the post, profile and group stores.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Record not found: {0}")]
    NotFound(String),
    #[error("Record conflicts with an existing row: {0}")]
    Conflict(String),
    #[error("Repository database error: {0}")]
    DatabaseError(String),
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        if is_unique_violation(&err) {
            RepositoryError::Conflict(err.to_string())
        } else {
            RepositoryError::DatabaseError(err.to_string())
        }
    }
}

// === QueueError ===

/// Errors from the job queue.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("No queue handler registered for: {0}")]
    UnknownHandler(String),
    #[error("Invalid job payload: {0}")]
    InvalidPayload(String),
    #[error("Queue handler {handler} failed: {message}")]
    HandlerFailed { handler: String, message: String },
}

// === ImportError ===

/// Errors from bookmark archive import.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Bookmark import is disabled")]
    Disabled,
    #[error("Profile {0} may not import bookmarks")]
    PermissionDenied(String),
    #[error("Could not parse bookmark export: {0}")]
    Parse(String),
    #[error(transparent)]
    Queue(#[from] QueueError),
    #[error(transparent)]
    Bookmark(#[from] BookmarkError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

// === SettingsError ===

/// Errors related to settings management.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Settings I/O error: {0}")]
    IoError(String),
    #[error("Settings serialization error: {0}")]
    SerializationError(String),
    #[error("Invalid settings key: {0}")]
    InvalidKey(String),
    #[error("Invalid settings value: {0}")]
    InvalidValue(String),
}
