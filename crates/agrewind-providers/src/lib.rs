// Error types
pub mod error;

// Claude Code session logs
pub mod claude;

pub use claude::{
    LogEntry, change_id, decode_line, extract_change, is_file_mutating_tool, list_session_files,
    read_entries, select_latest, session_summary,
};

pub use error::{Error, Result};
