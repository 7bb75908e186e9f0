use crate::Result;
use agrewind_types::{SessionSummary, truncate};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::schema::{ContentBlock, LogEntry};
use super::tools::is_file_mutating_tool;

/// Decode a single log line.
///
/// Returns `None` for blank lines and for lines that are not a valid record;
/// the log may be appended to while we read, so a truncated trailing line is
/// expected and never fatal.
pub fn decode_line(line: &[u8]) -> Option<LogEntry> {
    let line = line.trim_ascii();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_slice::<LogEntry>(line) {
        Ok(entry) => Some(entry),
        Err(err) => {
            tracing::debug!(error = %err, "skipping undecodable log line");
            None
        }
    }
}

/// Streaming decoder over a line-delimited log.
///
/// Yields decoded entries in file order; undecodable lines are skipped, only
/// read failures are surfaced.
pub struct Entries<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: BufRead> Entries<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
        }
    }
}

impl<R: BufRead> Iterator for Entries<R> {
    type Item = std::io::Result<LogEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {
                    if let Some(entry) = decode_line(&self.buf) {
                        return Some(Ok(entry));
                    }
                }
                Err(err) => return Some(Err(err)),
            }
        }
    }
}

/// Read and decode every entry of a session log.
pub fn read_entries(path: &Path) -> Result<Vec<LogEntry>> {
    let file = File::open(path)?;
    let entries = Entries::new(BufReader::new(file)).collect::<std::io::Result<Vec<_>>>()?;
    Ok(entries)
}

/// Summarize a session log in one streaming pass without building turns.
pub fn session_summary(path: &Path, snippet_length: usize) -> Result<SessionSummary> {
    let file = File::open(path)?;
    let mut summary = SessionSummary::default();

    for entry in Entries::new(BufReader::new(file)) {
        let entry = entry?;

        if summary.started_at.is_none() {
            summary.started_at = entry.timestamp();
        }

        match &entry {
            LogEntry::User(record) => {
                if summary.first_message.is_none() && !record.message.content.is_tool_result_echo()
                {
                    let text = record.message.content.joined_text("\n");
                    if !text.trim().is_empty() {
                        summary.first_message = Some(truncate(text.trim(), snippet_length));
                    }
                }
            }
            LogEntry::Assistant(record) => {
                summary.change_count += record
                    .message
                    .content
                    .blocks()
                    .iter()
                    .filter(|b| {
                        matches!(b, ContentBlock::ToolUse { name, .. } if is_file_mutating_tool(name))
                    })
                    .count();
            }
            LogEntry::Other => {}
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_decode_line_skips_blank_and_garbage() {
        assert!(decode_line(b"").is_none());
        assert!(decode_line(b"   \n").is_none());
        assert!(decode_line(b"{not json").is_none());
        assert!(decode_line(br#"{"type":"user","timestamp":"2025-01-01T00:00:00Z""#).is_none());
    }

    #[test]
    fn test_decode_line_unknown_type_is_other() {
        let entry = decode_line(br#"{"type":"summary","summary":"x","leafUuid":"u"}"#).unwrap();
        assert!(matches!(entry, LogEntry::Other));
    }

    #[test]
    fn test_user_without_timestamp_is_skipped() {
        assert!(decode_line(br#"{"type":"user","message":{"content":"hi"}}"#).is_none());
    }

    #[test]
    fn test_entries_survive_corrupt_middle_line() {
        let log = concat!(
            r#"{"type":"user","timestamp":"2025-01-01T00:00:00Z","message":{"role":"user","content":"first"}}"#,
            "\n",
            "\u{0}\u{1}garbage\n",
            r#"{"type":"user","timestamp":"2025-01-01T00:00:01Z","message":{"role":"user","content":"second"}}"#,
            "\n",
            r#"{"type":"assistant","timestamp":"2025-01-01T00:00:02Z","message":{"content":[{"type":"te"#,
        );

        let entries: Vec<LogEntry> = Entries::new(Cursor::new(log.as_bytes()))
            .collect::<std::io::Result<_>>()
            .unwrap();

        assert_eq!(entries.len(), 2);
        let texts: Vec<String> = entries
            .iter()
            .map(|e| match e {
                LogEntry::User(r) => r.message.content.joined_text(""),
                _ => String::new(),
            })
            .collect();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[test]
    fn test_malformed_block_keeps_sibling_tool_use() {
        let line = br#"{"type":"assistant","timestamp":"2025-01-01T00:00:00Z","message":{"content":[{"type":"text"},{"type":"tool_use","id":"t1","name":"Write","input":{"file_path":"/p/a.txt","content":"x"}}]}}"#;

        let Some(LogEntry::Assistant(record)) = decode_line(line) else {
            panic!("assistant record should decode");
        };
        let blocks = record.message.content.blocks();
        assert!(matches!(blocks[0], ContentBlock::Unknown));
        assert!(matches!(&blocks[1], ContentBlock::ToolUse { name, .. } if name == "Write"));
    }

    #[test]
    fn test_invalid_utf8_line_is_skipped() {
        let mut log = Vec::new();
        log.extend_from_slice(b"\xff\xfe\xfd\n");
        log.extend_from_slice(
            br#"{"type":"user","timestamp":"2025-01-01T00:00:00Z","message":{"content":"ok"}}"#,
        );

        let entries: Vec<LogEntry> = Entries::new(Cursor::new(log))
            .collect::<std::io::Result<_>>()
            .unwrap();
        assert_eq!(entries.len(), 1);
    }
}
