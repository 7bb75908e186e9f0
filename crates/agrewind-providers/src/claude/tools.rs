//! Claude Code file-mutating tool argument types
//!
//! These structs mirror the exact input schema of the tools that change files
//! on disk. Every other tool (Bash, Read, Grep, ...) is ignored.

use agrewind_types::{ChangePayload, FileChange, ReplaceOp};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const WRITE_TOOL: &str = "Write";
pub const EDIT_TOOL: &str = "Edit";
pub const MULTI_EDIT_TOOL: &str = "MultiEdit";

pub fn is_file_mutating_tool(name: &str) -> bool {
    matches!(name, WRITE_TOOL | EDIT_TOOL | MULTI_EDIT_TOOL)
}

/// Claude Code Write tool arguments
///
/// # Format
/// ```json
/// {
///   "file_path": "/abs/path/test.txt",
///   "content": "hello world"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaudeWriteArgs {
    #[serde(default)]
    pub file_path: Option<String>,
    pub content: String,
}

/// Claude Code Edit tool arguments
///
/// # Format
/// ```json
/// {
///   "file_path": "/abs/path/src/lib.rs",
///   "old_string": "old code",
///   "new_string": "new code",
///   "replace_all": false
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaudeEditArgs {
    #[serde(default)]
    pub file_path: Option<String>,
    pub old_string: String,
    pub new_string: String,
    #[serde(default)]
    pub replace_all: bool,
}

impl ClaudeEditArgs {
    pub fn to_replace_op(&self) -> ReplaceOp {
        ReplaceOp::new(&self.old_string, &self.new_string, self.replace_all)
    }
}

/// One entry of a MultiEdit `edits` array
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaudeEditOperation {
    pub old_string: String,
    pub new_string: String,
    #[serde(default)]
    pub replace_all: bool,
}

/// Claude Code MultiEdit tool arguments
///
/// # Format
/// ```json
/// {
///   "file_path": "/abs/path/src/lib.rs",
///   "edits": [
///     { "old_string": "a", "new_string": "b" },
///     { "old_string": "c", "new_string": "d", "replace_all": true }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaudeMultiEditArgs {
    #[serde(default)]
    pub file_path: Option<String>,
    pub edits: Vec<ClaudeEditOperation>,
}

impl ClaudeMultiEditArgs {
    pub fn to_replace_ops(&self) -> Vec<ReplaceOp> {
        self.edits
            .iter()
            .map(|e| ReplaceOp::new(&e.old_string, &e.new_string, e.replace_all))
            .collect()
    }
}

/// A file change before it is given an id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedChange {
    pub file_path: String,
    pub payload: ChangePayload,
}

impl ExtractedChange {
    pub fn into_file_change(self, id: String, timestamp: DateTime<Utc>) -> FileChange {
        FileChange {
            id,
            timestamp,
            file_path: self.file_path,
            payload: self.payload,
        }
    }
}

/// Normalize one tool invocation into a file change.
///
/// Returns `None` for tools that do not mutate files and for invocations
/// whose arguments are malformed or lack a target path.
pub fn extract_change(tool_name: &str, input: &Value) -> Option<ExtractedChange> {
    let (file_path, payload) = match tool_name {
        WRITE_TOOL => {
            let args = ClaudeWriteArgs::deserialize(input).ok()?;
            (
                args.file_path,
                ChangePayload::Write {
                    content: args.content,
                },
            )
        }
        EDIT_TOOL => {
            let args = ClaudeEditArgs::deserialize(input).ok()?;
            let op = args.to_replace_op();
            (args.file_path, ChangePayload::Edit { edits: vec![op] })
        }
        MULTI_EDIT_TOOL => {
            let args = ClaudeMultiEditArgs::deserialize(input).ok()?;
            let edits = args.to_replace_ops();
            (args.file_path, ChangePayload::Edit { edits })
        }
        _ => return None,
    };

    let file_path = file_path.filter(|p| !p.trim().is_empty())?;
    Some(ExtractedChange { file_path, payload })
}

/// Id of the `position`-th (1-based) change extracted from one log entry.
pub fn change_id(
    turn_id: &str,
    timestamp: DateTime<Utc>,
    tool_name: &str,
    position: usize,
) -> String {
    format!(
        "{}-{}-{}-{}",
        turn_id,
        timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
        tool_name,
        position
    )
}
