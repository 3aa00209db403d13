//! Decides whether an inbound activity is "post a bookmark".

use crate::types::activity::{is_schema_term, Activity};

/// True iff the verb is `post` and the activity's object is a `bookmark`.
/// Accepts both short terms and full Activity Streams IRIs.
pub fn is_post_bookmark(activity: &Activity) -> bool {
    is_schema_term(&activity.verb, "post")
        && activity
            .first_object()
            .is_some_and(|object| is_schema_term(&object.object_type, "bookmark"))
}
