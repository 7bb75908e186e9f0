use serde::{Deserialize, Serialize};
use std::fmt;

/// Directory name under the log root that holds one project's sessions.
///
/// Produced by escaping the project's working directory, e.g.
/// `/Users/me/my.app` becomes `-Users-me-my-app`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectKey(String);

impl ProjectKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ProjectKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ProjectKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for ProjectKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
