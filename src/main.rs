//! fedmarks command line.
//!
//! ```text
//! fedmarks ingest <db> <activity.json>... [--profile <uri>]
//! fedmarks import <db> <profile-uri|nickname> <export.html>
//! fedmarks render <db> <post-uri>
//! ```
//!
//! Settings come from `$FEDMARKS_CONFIG` or `./fedmarks.json`.

use std::error::Error;
use std::fs;
use std::process::ExitCode;

use fedmarks::app::App;
use fedmarks::managers::post_manager::{PostManager, PostRepository};
use fedmarks::managers::profile_manager::{ProfileManager, ProfileRepository};
use fedmarks::services::author_resolver::FeedOwner;
use fedmarks::services::logging;
use fedmarks::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use fedmarks::types::activity::{Activity, ActivityObject};
use fedmarks::types::profile::{NewProfile, Profile};
use fedmarks::types::settings::FedmarksSettings;
use tracing::{error, info, warn};

const USAGE: &str = "usage:
  fedmarks ingest <db> <activity.json>... [--profile <uri>]
  fedmarks import <db> <profile-uri|nickname> <export.html>
  fedmarks render <db> <post-uri>";

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let mut engine = SettingsEngine::new(None);
    let settings = match engine.load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    logging::init(&settings.logging.filter);

    let result = match args.first().map(String::as_str) {
        Some("ingest") => ingest(&args[1..], settings),
        Some("import") => import(&args[1..], settings),
        Some("render") => render(&args[1..], settings),
        _ => {
            eprintln!("{}", USAGE);
            return ExitCode::from(2);
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "command failed");
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn ingest(args: &[String], settings: FedmarksSettings) -> Result<(), Box<dyn Error>> {
    let mut profile_uri: Option<String> = None;
    let mut positional: Vec<&String> = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--profile" {
            profile_uri = Some(iter.next().ok_or("--profile needs a value")?.clone());
        } else {
            positional.push(arg);
        }
    }
    let (db_path, files) = positional.split_first().ok_or(USAGE)?;
    if files.is_empty() {
        return Err(USAGE.into());
    }

    let app = App::new(db_path, settings)?;
    for file in files {
        let activity: Activity = serde_json::from_str(&fs::read_to_string(file)?)?;
        let owner_object = match &profile_uri {
            Some(uri) => ActivityObject {
                id: Some(uri.clone()),
                ..ActivityObject::default()
            },
            None => activity
                .actor
                .clone()
                .ok_or_else(|| format!("{}: activity has no actor; pass --profile", file))?,
        };
        let owner = ProfileManager::new(app.db.connection()).ensure_remote_profile(&owner_object)?;

        match app.receive_feed_entry(&activity, &FeedOwner::Profile(owner)) {
            Ok(Some(post)) => println!("{} -> {}", file, post.uri),
            Ok(None) => println!("{}: not a bookmark, skipped", file),
            Err(e) => {
                warn!(file = %file, kind = ?e.kind(), error = %e, "activity rejected");
                println!("{}: rejected: {}", file, e);
            }
        }
    }
    Ok(())
}

fn import(args: &[String], settings: FedmarksSettings) -> Result<(), Box<dyn Error>> {
    let [db_path, who, export_path] = args else {
        return Err(USAGE.into());
    };
    let html = fs::read_to_string(export_path)?;

    let mut app = App::new(db_path, settings)?;
    let profile = local_profile(&app, who)?;
    app.import_delicious(&profile, &html)?;
    let report = app.run_queue();
    info!(processed = report.processed, failed = report.failed, "import finished");
    println!("processed {} jobs, {} failed", report.processed, report.failed);
    Ok(())
}

/// Looks `who` up by URI, then as a local nickname, creating the local
/// profile if neither exists.
fn local_profile(app: &App, who: &str) -> Result<Profile, Box<dyn Error>> {
    let profiles = ProfileManager::new(app.db.connection());
    if let Some(profile) = profiles.find_by_uri(who)? {
        return Ok(profile);
    }
    if let Some(profile) = profiles.find_local_by_nickname(who)? {
        return Ok(profile);
    }
    info!(nickname = who, "creating local profile");
    let profile = profiles.create(&NewProfile {
        uri: format!("{}/user/{}", app.settings.site.root_url(), who),
        nickname: who.to_string(),
        is_local: true,
        ..NewProfile::default()
    })?;
    Ok(profile)
}

fn render(args: &[String], settings: FedmarksSettings) -> Result<(), Box<dyn Error>> {
    let [db_path, post_uri] = args else {
        return Err(USAGE.into());
    };
    let app = App::new(db_path, settings)?;
    let post = PostManager::new(app.db.connection())
        .find_by_uri(post_uri)?
        .ok_or_else(|| format!("no post with uri {}", post_uri))?;

    match app.render_activity(&post)? {
        Some(activity) => println!("{}", serde_json::to_string_pretty(&activity)?),
        None => println!("{} is not a bookmark", post_uri),
    }
    Ok(())
}
