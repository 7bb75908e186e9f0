// Engine module - turn reconstruction and change simulation
// This layer sits between decoded log entries (providers) and the runtime
// that serves and reverts changes.

pub mod diff;
mod turn;

pub use diff::{
    DiffContext, EditError, RevertStatus, apply_edits, process_changes, sort_newest_first,
    unified_diff,
};
pub use turn::{TurnBuilder, TurnReducer, attach_parsed_changes};

use agrewind_providers::LogEntry;
use agrewind_types::ConversationTurn;

/// Build the conversation turns of a session from its decoded entries.
pub fn build_turns<I>(session_id: &str, entries: I) -> Vec<ConversationTurn>
where
    I: IntoIterator<Item = LogEntry>,
{
    let mut reducer = TurnReducer::new(session_id);
    for entry in entries {
        reducer.push(&entry);
    }
    reducer.finish()
}
