use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::change::{AttributedChange, FileChange, ParsedChange};
use super::session::SessionFile;

/// Placeholder user message for agent output that precedes any human message.
pub const NO_USER_MESSAGE: &str = "no message";

/// One human message and everything the agent did in response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationTurn {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub user_message: String,
    pub assistant_message: String,
    pub changes: Vec<FileChange>,
}

impl ConversationTurn {
    /// Changes of this turn tagged with the turn's id and user message.
    pub fn attributed_changes(&self) -> impl Iterator<Item = AttributedChange> + '_ {
        self.changes.iter().map(|change| AttributedChange {
            change: change.clone(),
            turn_id: self.id.clone(),
            user_message: self.user_message.clone(),
        })
    }
}

/// A turn whose changes carry diffs and revert status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedTurn {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub user_message: String,
    pub assistant_message: String,
    pub changes: Vec<ParsedChange>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTurns {
    pub session: SessionFile,
    pub turns: Vec<ParsedTurn>,
}
