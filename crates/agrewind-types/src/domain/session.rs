use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A session log file discovered under a project's log directory.
///
/// Sessions are read-only inputs: nothing in agrewind ever writes to them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionFile {
    /// File stem of the log file.
    pub id: String,
    pub path: PathBuf,
    pub modified: DateTime<Utc>,
    /// Set on exactly one session per project: the most recently modified one.
    #[serde(default)]
    pub is_latest: bool,
}

/// Cheap listing summary of a session, gathered in a single streaming pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetadata {
    pub id: String,
    pub path: PathBuf,
    pub modified: DateTime<Utc>,
    pub is_latest: bool,
    /// First timestamp encountered in the log.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    /// First genuine human message, truncated for display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_message: Option<String>,
    /// Number of file-mutating tool invocations in the session.
    pub change_count: usize,
}

impl SessionMetadata {
    pub fn new(file: &SessionFile, summary: SessionSummary) -> Self {
        Self {
            id: file.id.clone(),
            path: file.path.clone(),
            modified: file.modified,
            is_latest: file.is_latest,
            started_at: summary.started_at,
            first_message: summary.first_message,
            change_count: summary.change_count,
        }
    }
}

/// Content-derived part of [`SessionMetadata`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub started_at: Option<DateTime<Utc>>,
    pub first_message: Option<String>,
    pub change_count: usize,
}
