//! Change simulation: replays a batch of file changes against the working
//! tree (in memory) and captures before/after snapshots plus a unified diff
//! for each one.

use agrewind_types::{AttributedChange, ChangePayload, ParsedChange, ReplaceOp};
use similar::TextDiff;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::io::ErrorKind;

const DIFF_CONTEXT_LINES: usize = 3;
const CREATION_HEADER: &str = "/dev/null";

/// Revert status lookup consulted when computing `can_revert`.
pub trait RevertStatus {
    fn is_reverted(&self, change_id: &str) -> bool;
}

impl RevertStatus for HashSet<String> {
    fn is_reverted(&self, change_id: &str) -> bool {
        self.contains(change_id)
    }
}

pub struct DiffContext<'a> {
    /// Changes belong to the most recent session of the project.
    pub is_latest_session: bool,
    pub reverted: &'a dyn RevertStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    /// The text to replace does not occur in the file.
    AnchorNotFound { op_index: usize },
    /// An empty anchor is only meaningful for an empty file.
    EmptyAnchor { op_index: usize },
}

impl fmt::Display for EditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditError::AnchorNotFound { op_index } => write!(
                f,
                "edit #{} could not be applied: text to replace not found",
                op_index + 1
            ),
            EditError::EmptyAnchor { op_index } => write!(
                f,
                "edit #{} could not be applied: empty text to replace in a non-empty file",
                op_index + 1
            ),
        }
    }
}

impl std::error::Error for EditError {}

/// Apply replacement operations in order.
///
/// `all_occurrences` selects a global replace, otherwise only the first match
/// is replaced.
pub fn apply_edits(before: &str, edits: &[ReplaceOp]) -> Result<String, EditError> {
    let mut text = before.to_string();

    for (op_index, op) in edits.iter().enumerate() {
        if op.old.is_empty() {
            if !text.is_empty() {
                return Err(EditError::EmptyAnchor { op_index });
            }
            text = op.new.clone();
            continue;
        }

        if !text.contains(&op.old) {
            return Err(EditError::AnchorNotFound { op_index });
        }

        text = if op.all_occurrences {
            text.replace(&op.old, &op.new)
        } else {
            text.replacen(&op.old, &op.new, 1)
        };
    }

    Ok(text)
}

/// Line-oriented unified diff of `before` → `after`.
///
/// Empty when both are identical.
pub fn unified_diff(file_path: &str, before: &str, after: &str, is_creation: bool) -> String {
    let old_header = if is_creation {
        CREATION_HEADER
    } else {
        file_path
    };

    TextDiff::from_lines(before, after)
        .unified_diff()
        .context_radius(DIFF_CONTEXT_LINES)
        .header(old_header, file_path)
        .to_string()
}

enum Baseline {
    Known(String),
    Missing,
    Unreadable(String),
}

fn read_baseline(file_path: &str) -> Baseline {
    match std::fs::read_to_string(file_path) {
        Ok(content) => Baseline::Known(content),
        Err(err) if err.kind() == ErrorKind::NotFound => Baseline::Missing,
        Err(err) => Baseline::Unreadable(format!("cannot read {}: {}", file_path, err)),
    }
}

/// Simulate a batch of changes as one timeline.
///
/// The "before" of each change is the simulated result of the latest earlier
/// change to the same path, else the file on disk, else empty (a creation).
/// A change that cannot be simulated is flagged and the batch continues.
pub fn process_changes<I>(changes: I, ctx: &DiffContext<'_>) -> Vec<ParsedChange>
where
    I: IntoIterator<Item = AttributedChange>,
{
    let mut simulated: HashMap<String, String> = HashMap::new();
    let mut parsed = Vec::new();

    for AttributedChange {
        change,
        turn_id,
        user_message,
    } in changes
    {
        let (before, is_creation, mut error) = match simulated.get(&change.file_path) {
            Some(content) => (content.clone(), false, None),
            None => match read_baseline(&change.file_path) {
                Baseline::Known(content) => (content, false, None),
                Baseline::Missing => (String::new(), true, None),
                Baseline::Unreadable(reason) => (String::new(), false, Some(reason)),
            },
        };

        let after = if error.is_some() {
            before.clone()
        } else {
            match &change.payload {
                ChangePayload::Write { content } => content.clone(),
                ChangePayload::Edit { edits } => match apply_edits(&before, edits) {
                    Ok(text) => text,
                    Err(err) => {
                        error = Some(err.to_string());
                        before.clone()
                    }
                },
            }
        };

        if let Some(reason) = &error {
            tracing::warn!(change_id = %change.id, file = %change.file_path, %reason, "change flagged as unrevertable");
        } else {
            simulated.insert(change.file_path.clone(), after.clone());
        }

        let diff = unified_diff(&change.file_path, &before, &after, is_creation);
        let can_revert =
            ctx.is_latest_session && error.is_none() && !ctx.reverted.is_reverted(&change.id);

        parsed.push(ParsedChange {
            change,
            diff,
            before,
            after,
            is_creation,
            can_revert,
            is_latest_session: ctx.is_latest_session,
            turn_id,
            user_message,
            error,
        });
    }

    parsed
}

/// Order changes newest first; equal timestamps keep their relative order.
pub fn sort_newest_first(changes: &mut [ParsedChange]) {
    changes.sort_by(|a, b| b.change.timestamp.cmp(&a.change.timestamp));
}
