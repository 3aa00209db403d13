//! Property-based tests for FedmarksSettings serialization round-trip.
//!
//! These tests verify that FedmarksSettings can be serialized to JSON and
//! deserialized back without data loss, both in memory and through the
//! settings engine's file storage.

use fedmarks::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use fedmarks::types::settings::{
    AttachmentSettings, BookmarkSettings, FedmarksSettings, LoggingSettings, SiteSettings,
};
use proptest::prelude::*;
use tempfile::TempDir;

fn arb_site() -> impl Strategy<Value = SiteSettings> {
    (
        "[a-z][a-z0-9-]{0,20}(\\.[a-z]{2,6})?",
        proptest::option::of("[a-z]{1,10}"),
        any::<bool>(),
    )
        .prop_map(|(server, path, https)| SiteSettings {
            server,
            path: path.unwrap_or_default(),
            https,
        })
}

fn arb_bookmark() -> impl Strategy<Value = BookmarkSettings> {
    (any::<bool>(), 1usize..100_000).prop_map(|(import_enabled, max_import_batch)| BookmarkSettings {
        import_enabled,
        max_import_batch,
    })
}

fn arb_logging() -> impl Strategy<Value = LoggingSettings> {
    prop_oneof![
        Just("error"),
        Just("warn"),
        Just("info"),
        Just("debug"),
        Just("fedmarks=trace,info"),
    ]
    .prop_map(|filter| LoggingSettings {
        filter: filter.to_string(),
    })
}

fn arb_settings() -> impl Strategy<Value = FedmarksSettings> {
    (arb_site(), arb_bookmark(), any::<bool>(), arb_logging()).prop_map(
        |(site, bookmark, show_thumbs, logging)| FedmarksSettings {
            site,
            bookmark,
            attachments: AttachmentSettings { show_thumbs },
            logging,
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    #[test]
    fn settings_json_roundtrip(settings in arb_settings()) {
        let json = serde_json::to_string(&settings).unwrap();
        let parsed: FedmarksSettings = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(parsed, settings);
    }

    #[test]
    fn settings_file_roundtrip(settings in arb_settings()) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fedmarks.json").to_string_lossy().to_string();

        SettingsEngine::with_settings(&path, settings.clone()).save().unwrap();
        let mut engine = SettingsEngine::new(Some(path));
        let loaded = engine.load().unwrap();
        prop_assert_eq!(loaded, settings);
    }
}
