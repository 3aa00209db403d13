use serde::{Deserialize, Serialize};

/// Top-level settings container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct FedmarksSettings {
    pub site: SiteSettings,
    pub bookmark: BookmarkSettings,
    pub attachments: AttachmentSettings,
    pub logging: LoggingSettings,
}

/// Public address of this node; used to mint local URIs and permalinks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SiteSettings {
    pub server: String,
    pub path: String,
    pub https: bool,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            server: "localhost".to_string(),
            path: String::new(),
            https: false,
        }
    }
}

impl SiteSettings {
    /// Root URL without a trailing slash, e.g. `https://example.net/social`.
    pub fn root_url(&self) -> String {
        let scheme = if self.https { "https" } else { "http" };
        let path = self.path.trim_matches('/');
        if path.is_empty() {
            format!("{}://{}", scheme, self.server)
        } else {
            format!("{}://{}/{}", scheme, self.server, path)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookmarkSettings {
    pub import_enabled: bool,
    /// Upper bound on entries taken from a single export file.
    pub max_import_batch: usize,
}

impl Default for BookmarkSettings {
    fn default() -> Self {
        Self {
            import_enabled: true,
            max_import_batch: 5000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttachmentSettings {
    pub show_thumbs: bool,
}

impl Default for AttachmentSettings {
    fn default() -> Self {
        Self { show_thumbs: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingSettings {
    /// `tracing_subscriber::EnvFilter` directive; `RUST_LOG` wins when set.
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}
