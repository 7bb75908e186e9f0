use agrewind_providers::claude::{ContentBlock, LogEntry, MessageContent, MessageRecord};
use agrewind_providers::{change_id, extract_change};
use agrewind_types::{ConversationTurn, FileChange, NO_USER_MESSAGE, ParsedChange, ParsedTurn};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

const ASSISTANT_TEXT_SEPARATOR: &str = "\n\n";

pub struct TurnBuilder {
    id: String,
    timestamp: DateTime<Utc>,
    user_message: String,
    assistant_parts: Vec<String>,
    changes: Vec<FileChange>,
}

impl TurnBuilder {
    pub fn new(id: String, timestamp: DateTime<Utc>, user_message: String) -> Self {
        Self {
            id,
            timestamp,
            user_message,
            assistant_parts: Vec::new(),
            changes: Vec::new(),
        }
    }

    /// Absorb one assistant record: file changes and text, in block order.
    pub fn add_assistant(&mut self, record: &MessageRecord) {
        let mut position = 0;

        for block in record.message.content.blocks() {
            match block {
                ContentBlock::ToolUse { name, input, .. } => {
                    let Some(extracted) = extract_change(name, input) else {
                        continue;
                    };
                    position += 1;
                    let id = change_id(&self.id, record.timestamp, name, position);
                    self.changes
                        .push(extracted.into_file_change(id, record.timestamp));
                }
                ContentBlock::Text { text } => {
                    if !text.is_empty() {
                        self.assistant_parts.push(text.clone());
                    }
                }
                ContentBlock::ToolResult { .. } | ContentBlock::Unknown => {}
            }
        }
    }

    /// Finish the turn; turns without file changes are dropped.
    pub fn build(self) -> Option<ConversationTurn> {
        if self.changes.is_empty() {
            return None;
        }

        Some(ConversationTurn {
            id: self.id,
            timestamp: self.timestamp,
            user_message: self.user_message,
            assistant_message: self.assistant_parts.join(ASSISTANT_TEXT_SEPARATOR),
            changes: self.changes,
        })
    }
}

/// Reducer over a session's entries. State is the currently open turn.
pub struct TurnReducer {
    session_id: String,
    next_seq: usize,
    current: Option<TurnBuilder>,
    turns: Vec<ConversationTurn>,
}

impl TurnReducer {
    pub fn new(session_id: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            next_seq: 0,
            current: None,
            turns: Vec::new(),
        }
    }

    fn open_turn(&mut self, timestamp: DateTime<Utc>, user_message: String) {
        self.close_turn();
        let id = format!("{}-{}", self.session_id, self.next_seq);
        self.next_seq += 1;
        self.current = Some(TurnBuilder::new(id, timestamp, user_message));
    }

    fn close_turn(&mut self) {
        if let Some(turn) = self.current.take().and_then(TurnBuilder::build) {
            self.turns.push(turn);
        }
    }

    pub fn push(&mut self, entry: &LogEntry) {
        match entry {
            LogEntry::User(record) => {
                if record.message.content.is_tool_result_echo() {
                    return;
                }
                let text = record.message.content.joined_text("\n");
                self.open_turn(record.timestamp, text);
            }
            LogEntry::Assistant(record) => {
                if matches!(record.message.content, MessageContent::Text(_)) {
                    return;
                }
                if self.current.is_none() {
                    self.open_turn(record.timestamp, NO_USER_MESSAGE.to_string());
                }
                if let Some(turn) = self.current.as_mut() {
                    turn.add_assistant(record);
                }
            }
            LogEntry::Other => {}
        }
    }

    pub fn finish(mut self) -> Vec<ConversationTurn> {
        self.close_turn();
        self.turns
    }
}

/// Regroup processed changes under the turns they came from.
///
/// Changes keep the order they have in `parsed`; turns keep their order.
pub fn attach_parsed_changes(
    turns: Vec<ConversationTurn>,
    parsed: Vec<ParsedChange>,
) -> Vec<ParsedTurn> {
    let mut by_turn: HashMap<String, Vec<ParsedChange>> = HashMap::new();
    for change in parsed {
        by_turn.entry(change.turn_id.clone()).or_default().push(change);
    }

    turns
        .into_iter()
        .map(|turn| ParsedTurn {
            changes: by_turn.remove(&turn.id).unwrap_or_default(),
            id: turn.id,
            timestamp: turn.timestamp,
            user_message: turn.user_message,
            assistant_message: turn.assistant_message,
        })
        .collect()
}
