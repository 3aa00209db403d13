// fedmarks services
// Services implement the bookmark pipeline: classification, extraction, authorship, rendering,
// lifecycle events, the import queue, settings and logging.

pub mod activity_classifier;
pub mod author_resolver;
pub mod bookmark_plugin;
pub mod canonical;
pub mod delicious_importer;
pub mod events;
pub mod job_queue;
pub mod link_extractor;
pub mod logging;
pub mod post_renderer;
pub mod settings_engine;
