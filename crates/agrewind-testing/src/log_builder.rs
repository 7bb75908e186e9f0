//! Fluent builder for line-delimited session logs.
//!
//! Produces the record shapes the agent writes: `user` records with string or
//! block content, `assistant` records with `text`/`tool_use` blocks, and
//! unrelated records such as `summary`. Timestamps start at
//! 2025-01-01T00:00:00Z and advance one second per record.

use chrono::{DateTime, Duration, SecondsFormat, TimeZone, Utc};
use serde_json::{Value, json};
use std::path::Path;

pub struct SessionLogBuilder {
    session_id: String,
    clock: DateTime<Utc>,
    next_tool_id: usize,
    lines: Vec<String>,
}

impl Default for SessionLogBuilder {
    fn default() -> Self {
        Self::new("test-session")
    }
}

impl SessionLogBuilder {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            clock: Utc
                .with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
                .single()
                .expect("valid base timestamp"),
            next_tool_id: 1,
            lines: Vec::new(),
        }
    }

    fn tick(&mut self) -> String {
        let ts = self.clock.to_rfc3339_opts(SecondsFormat::Millis, true);
        self.clock += Duration::seconds(1);
        ts
    }

    fn record(mut self, kind: &str, content: Value) -> Self {
        let timestamp = self.tick();
        let role = if kind == "assistant" { "assistant" } else { "user" };
        let line = json!({
            "type": kind,
            "sessionId": self.session_id,
            "uuid": format!("{}-{}", self.session_id, self.lines.len()),
            "timestamp": timestamp,
            "message": { "role": role, "content": content },
        });
        self.lines.push(line.to_string());
        self
    }

    /// Genuine human message with string content.
    pub fn user(self, text: &str) -> Self {
        self.record("user", json!(text))
    }

    /// Tool-result echo for the most recent tool invocation.
    pub fn tool_result(self) -> Self {
        let id = format!("toolu_{}", self.next_tool_id.saturating_sub(1));
        self.record(
            "user",
            json!([{ "type": "tool_result", "tool_use_id": id, "content": "ok" }]),
        )
    }

    pub fn assistant(self, blocks: Vec<Value>) -> Self {
        self.record("assistant", Value::Array(blocks))
    }

    pub fn assistant_text(self, text: &str) -> Self {
        self.assistant(vec![text_block(text)])
    }

    pub fn write(mut self, path: &str, content: &str) -> Self {
        let block = self.tool_block("Write", json!({ "file_path": path, "content": content }));
        self.assistant(vec![block])
    }

    pub fn edit(mut self, path: &str, old: &str, new: &str, replace_all: bool) -> Self {
        let block = self.tool_block(
            "Edit",
            json!({
                "file_path": path,
                "old_string": old,
                "new_string": new,
                "replace_all": replace_all,
            }),
        );
        self.assistant(vec![block])
    }

    pub fn multi_edit(mut self, path: &str, edits: &[(&str, &str, bool)]) -> Self {
        let edits: Vec<Value> = edits
            .iter()
            .map(|(old, new, all)| json!({ "old_string": old, "new_string": new, "replace_all": all }))
            .collect();
        let block = self.tool_block("MultiEdit", json!({ "file_path": path, "edits": edits }));
        self.assistant(vec![block])
    }

    /// A `tool_use` block with a fresh tool id, for hand-built assistant records.
    pub fn tool_block(&mut self, name: &str, input: Value) -> Value {
        let id = format!("toolu_{}", self.next_tool_id);
        self.next_tool_id += 1;
        json!({ "type": "tool_use", "id": id, "name": name, "input": input })
    }

    /// Record the log storage writes that is neither user nor assistant.
    pub fn summary(mut self, text: &str) -> Self {
        let line = json!({ "type": "summary", "summary": text, "leafUuid": "leaf" });
        self.lines.push(line.to_string());
        self
    }

    /// Arbitrary raw line, e.g. a corrupt or truncated record.
    pub fn raw(mut self, line: &str) -> Self {
        self.lines.push(line.to_string());
        self
    }

    pub fn build(&self) -> String {
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }

    pub fn write_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.build())?;
        Ok(())
    }
}

pub fn text_block(text: &str) -> Value {
    json!({ "type": "text", "text": text })
}
