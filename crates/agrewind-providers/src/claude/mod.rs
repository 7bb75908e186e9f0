pub mod discovery;
pub mod io;
pub mod schema;
pub mod tools;

pub use self::discovery::{list_session_files, select_latest};
pub use self::io::{Entries, decode_line, read_entries, session_summary};
pub use self::schema::{ContentBlock, LogEntry, Message, MessageContent, MessageRecord};
pub use self::tools::{ExtractedChange, change_id, extract_change, is_file_mutating_tool};
