use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// One decoded line of a session log.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
#[serde(rename_all = "lowercase")]
pub enum LogEntry {
    User(MessageRecord),
    Assistant(MessageRecord),
    /// Summaries, file-history snapshots, system records, ...
    #[serde(other)]
    Other,
}

impl LogEntry {
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            LogEntry::User(record) | LogEntry::Assistant(record) => Some(record.timestamp),
            LogEntry::Other => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRecord {
    pub timestamp: DateTime<Utc>,
    pub message: Message,
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub cwd: Option<String>,
    #[serde(default)]
    pub is_sidechain: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub role: Option<String>,
    pub content: MessageContent,
}

/// Message content is either a bare string or a list of typed blocks.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(#[serde(deserialize_with = "blocks_lenient")] Vec<ContentBlock>),
}

/// Decode blocks one by one; a malformed block becomes [`ContentBlock::Unknown`]
/// instead of failing its siblings.
fn blocks_lenient<'de, D>(deserializer: D) -> Result<Vec<ContentBlock>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|value| {
            ContentBlock::deserialize(value).unwrap_or_else(|err| {
                tracing::debug!(error = %err, "malformed content block");
                ContentBlock::Unknown
            })
        })
        .collect())
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
#[serde(rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        #[serde(default)]
        id: Option<String>,
        name: String,
        #[serde(default)]
        input: Value,
    },
    ToolResult {
        #[serde(default)]
        tool_use_id: Option<String>,
        #[serde(default)]
        content: Option<Value>,
        #[serde(default)]
        is_error: bool,
    },
    /// thinking, image, ... carry nothing agrewind needs
    #[serde(other)]
    Unknown,
}

impl MessageContent {
    /// A user record that only echoes tool results back to the agent.
    ///
    /// True for block content with no non-empty `text` block and at least one
    /// `tool_result` block. String content is never an echo.
    pub fn is_tool_result_echo(&self) -> bool {
        match self {
            MessageContent::Text(_) => false,
            MessageContent::Blocks(blocks) => {
                let has_text = blocks
                    .iter()
                    .any(|b| matches!(b, ContentBlock::Text { text } if !text.is_empty()));
                let has_tool_result = blocks
                    .iter()
                    .any(|b| matches!(b, ContentBlock::ToolResult { .. }));
                !has_text && has_tool_result
            }
        }
    }

    /// Non-empty text blocks joined with `separator`.
    pub fn joined_text(&self, separator: &str) -> String {
        match self {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Blocks(blocks) => blocks
                .iter()
                .filter_map(|b| match b {
                    ContentBlock::Text { text } if !text.is_empty() => Some(text.as_str()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join(separator),
        }
    }

    pub fn blocks(&self) -> &[ContentBlock] {
        match self {
            MessageContent::Text(_) => &[],
            MessageContent::Blocks(blocks) => blocks,
        }
    }
}
