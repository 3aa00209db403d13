use serde::{Deserialize, Serialize};

/// A local or federated actor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub id: i64,
    pub uri: String,
    pub nickname: String,
    pub fullname: Option<String>,
    pub profile_url: Option<String>,
    pub is_local: bool,
    pub silenced: bool,
}

impl Profile {
    /// Full name when known, otherwise the nickname.
    pub fn best_name(&self) -> &str {
        self.fullname
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.nickname)
    }
}

/// Fields needed to create a profile row.
#[derive(Debug, Clone, Default)]
pub struct NewProfile {
    pub uri: String,
    pub nickname: String,
    pub fullname: Option<String>,
    pub profile_url: Option<String>,
    pub is_local: bool,
}

/// A user group that posts can be addressed to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserGroup {
    pub id: i64,
    pub uri: String,
    pub nickname: String,
    pub fullname: Option<String>,
    pub is_local: bool,
}
