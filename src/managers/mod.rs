// fedmarks storage managers
// Managers own the SQL for profiles, groups, posts and bookmarks.

pub mod bookmark_manager;
pub mod group_manager;
pub mod post_manager;
pub mod profile_manager;
