use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Kind of file mutation requested by the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// Full-content replacement (or creation).
    Write,
    /// One or more string replacements.
    Edit,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Write => "write",
            ChangeKind::Edit => "edit",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single string replacement inside an `edit` change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceOp {
    pub old: String,
    pub new: String,
    /// Replace every occurrence instead of only the first one.
    #[serde(default)]
    pub all_occurrences: bool,
}

impl ReplaceOp {
    pub fn new(old: impl Into<String>, new: impl Into<String>, all_occurrences: bool) -> Self {
        Self {
            old: old.into(),
            new: new.into(),
            all_occurrences,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangePayload {
    Write { content: String },
    Edit { edits: Vec<ReplaceOp> },
}

/// A normalized file mutation extracted from one tool invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileChange {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub file_path: String,
    #[serde(flatten)]
    pub payload: ChangePayload,
}

impl FileChange {
    pub fn kind(&self) -> ChangeKind {
        match self.payload {
            ChangePayload::Write { .. } => ChangeKind::Write,
            ChangePayload::Edit { .. } => ChangeKind::Edit,
        }
    }

    pub fn path(&self) -> &Path {
        Path::new(&self.file_path)
    }
}

/// A change together with the turn it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributedChange {
    pub change: FileChange,
    pub turn_id: String,
    pub user_message: String,
}

/// A change enriched with its simulated diff and revert status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedChange {
    #[serde(flatten)]
    pub change: FileChange,
    /// Unified diff between `before` and `after`.
    pub diff: String,
    /// Full content of the target before this change.
    pub before: String,
    /// Full content of the target after this change.
    pub after: String,
    /// The target did not exist before this change.
    pub is_creation: bool,
    pub can_revert: bool,
    pub is_latest_session: bool,
    pub turn_id: String,
    pub user_message: String,
    /// Why the change could not be simulated (e.g. an edit anchor was missing).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ParsedChange {
    pub fn id(&self) -> &str {
        &self.change.id
    }

    pub fn path(&self) -> &Path {
        self.change.path()
    }
}

/// What a successful revert did on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevertAction {
    /// Target overwritten with its prior content.
    Restored,
    /// Created file removed.
    Deleted,
    /// Created file was already gone.
    AlreadyAbsent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevertOutcome {
    pub change_id: String,
    pub file_path: String,
    pub action: RevertAction,
    pub reverted_at: DateTime<Utc>,
}
