//! del.icio.us export import.
//!
//! Two queue handlers: `dlcsback` splits a Netscape-format bookmark export
//! into one `dlcsbkmk` job per entry; `dlcsbkmk` stores a single entry.
//! Jobs may be delivered more than once, so an entry that is already
//! bookmarked counts as imported.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::database::Database;
use crate::managers::bookmark_manager::{BookmarkManager, BookmarkManagerTrait};
use crate::managers::profile_manager::{ProfileManager, ProfileRepository};
use crate::services::canonical::canonical_tags;
use crate::services::job_queue::{Job, QueueHandler};
use crate::types::bookmark::{source, Bookmark, SaveOptions};
use crate::types::errors::{BookmarkError, ImportError, QueueError, RepositoryError};
use crate::types::post::PostOrigin;
use crate::types::settings::SiteSettings;

pub const BACKUP_HANDLER: &str = "dlcsback";
pub const BOOKMARK_HANDLER: &str = "dlcsbkmk";

/// One `<DT><A …>` entry of an export.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeliciousEntry {
    pub url: String,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub created: Option<DateTime<Utc>>,
    pub private: bool,
}

/// Payload of a `dlcsback` job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BackupJob {
    pub profile_id: i64,
    pub export_html: String,
    pub max_entries: usize,
}

/// Payload of a `dlcsbkmk` job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookmarkJob {
    pub profile_id: i64,
    pub entry: DeliciousEntry,
}

fn selector(css: &str) -> Result<Selector, ImportError> {
    Selector::parse(css).map_err(|e| ImportError::Parse(format!("{:?}", e)))
}

/// Parses a Netscape bookmark file as exported by del.icio.us.
///
/// Folder headings (`<DT><H3>`) are skipped; a `<DD>` following an entry
/// becomes its description.
pub fn parse_export(html: &str) -> Result<Vec<DeliciousEntry>, ImportError> {
    let document = Html::parse_document(html);
    let items = selector("dt, dd")?;

    let mut entries: Vec<DeliciousEntry> = Vec::new();
    let mut current: Option<usize> = None;

    for element in document.select(&items) {
        match element.value().name() {
            "dt" => {
                current = None;
                let anchor = element
                    .children()
                    .filter_map(ElementRef::wrap)
                    .find(|child| child.value().name() == "a");
                let Some(anchor) = anchor else {
                    continue;
                };
                let Some(href) = anchor.value().attr("href").map(str::trim).filter(|h| !h.is_empty()) else {
                    warn!("skipping export entry without href");
                    continue;
                };

                let tags = anchor
                    .value()
                    .attr("tags")
                    .map(|raw| canonical_tags(raw.split(|c: char| c == ',' || c.is_whitespace())))
                    .unwrap_or_default();
                let created = anchor
                    .value()
                    .attr("add_date")
                    .and_then(|raw| raw.trim().parse::<i64>().ok())
                    .and_then(|secs| DateTime::from_timestamp(secs, 0));
                let private = anchor.value().attr("private").is_some_and(|p| p.trim() == "1");

                entries.push(DeliciousEntry {
                    url: href.to_string(),
                    title: anchor.text().collect::<String>().trim().to_string(),
                    description: String::new(),
                    tags,
                    created,
                    private,
                });
                current = Some(entries.len() - 1);
            }
            "dd" => {
                if let Some(entry) = current.and_then(|idx| entries.get_mut(idx)) {
                    entry.description = element.text().collect::<String>().trim().to_string();
                }
                current = None;
            }
            _ => {}
        }
    }

    Ok(entries)
}

/// `dlcsback`: fans an export out into per-bookmark jobs.
#[derive(Debug, Default)]
pub struct DeliciousBackupImporter;

impl DeliciousBackupImporter {
    pub fn new() -> Self {
        Self
    }

    pub fn split(&self, job: &BackupJob) -> Result<Vec<Job>, ImportError> {
        let entries = parse_export(&job.export_html)?;
        if entries.len() > job.max_entries {
            warn!(
                profile_id = job.profile_id,
                found = entries.len(),
                limit = job.max_entries,
                "export exceeds import limit, truncating"
            );
        }
        info!(profile_id = job.profile_id, count = entries.len().min(job.max_entries), "queueing bookmarks for import");

        let mut jobs = Vec::new();
        for entry in entries.into_iter().take(job.max_entries) {
            jobs.push(Job::new(
                BOOKMARK_HANDLER,
                &BookmarkJob {
                    profile_id: job.profile_id,
                    entry,
                },
            )?);
        }
        Ok(jobs)
    }
}

impl QueueHandler for DeliciousBackupImporter {
    fn handle(&self, payload: &Value) -> Result<Vec<Job>, QueueError> {
        let job: BackupJob = Job::decode(payload)?;
        self.split(&job).map_err(|e| QueueError::HandlerFailed {
            handler: BACKUP_HANDLER.to_string(),
            message: e.to_string(),
        })
    }
}

/// `dlcsbkmk`: stores one exported bookmark for its profile.
pub struct DeliciousBookmarkImporter {
    db: Arc<Database>,
    site: SiteSettings,
}

impl DeliciousBookmarkImporter {
    pub fn new(db: Arc<Database>, site: SiteSettings) -> Self {
        Self { db, site }
    }

    /// Saves the entry. Returns `None` if the profile already has it.
    pub fn import_entry(&self, job: &BookmarkJob) -> Result<Option<Bookmark>, ImportError> {
        let conn = self.db.connection();
        let profile = ProfileManager::new(conn)
            .get_by_id(job.profile_id)?
            .ok_or_else(|| RepositoryError::NotFound(format!("profile {}", job.profile_id)))?;

        let entry = &job.entry;
        let options = SaveOptions {
            origin: if entry.private {
                PostOrigin::LocalNonPublic
            } else {
                PostOrigin::LocalPublic
            },
            source: Some(source::DELICIOUS.to_string()),
            created: entry.created,
            ..SaveOptions::default()
        };

        let mut store = BookmarkManager::new(conn, &self.site);
        match store.save_new(&profile, &entry.title, &entry.url, &entry.tags, &entry.description, options) {
            Ok((bookmark, _)) => Ok(Some(bookmark)),
            Err(BookmarkError::Duplicate { url, .. }) => {
                info!(profile_id = profile.id, url = %url, "bookmark already imported");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl QueueHandler for DeliciousBookmarkImporter {
    fn handle(&self, payload: &Value) -> Result<Vec<Job>, QueueError> {
        let job: BookmarkJob = Job::decode(payload)?;
        self.import_entry(&job).map_err(|e| QueueError::HandlerFailed {
            handler: BOOKMARK_HANDLER.to_string(),
            message: e.to_string(),
        })?;
        Ok(Vec::new())
    }
}
