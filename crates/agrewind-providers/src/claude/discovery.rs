use crate::Result;
use agrewind_types::SessionFile;
use chrono::{DateTime, Utc};
use std::path::Path;
use walkdir::WalkDir;

fn is_session_log(path: &Path) -> bool {
    path.is_file() && path.extension().is_some_and(|e| e == "jsonl")
}

/// List the session logs directly under a project's log directory.
///
/// A missing directory means the project has no sessions yet and yields an
/// empty list. Entries that vanish or cannot be read mid-scan are skipped.
pub fn list_session_files(project_log_dir: &Path) -> Result<Vec<SessionFile>> {
    if !project_log_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut sessions = Vec::new();

    for entry in WalkDir::new(project_log_dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::debug!(error = %err, "skipping unreadable log entry");
                continue;
            }
        };
        let path = entry.path();
        if !is_session_log(path) {
            continue;
        }

        let Some(id) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
            continue;
        };

        let modified = match entry.metadata().ok().and_then(|m| m.modified().ok()) {
            Some(time) => DateTime::<Utc>::from(time),
            None => continue,
        };

        sessions.push(SessionFile {
            id,
            path: path.to_path_buf(),
            modified,
            is_latest: false,
        });
    }

    Ok(sessions)
}

/// Order sessions newest first and flag the most recently modified one.
///
/// Equal modification times keep their incoming order (stable sort).
pub fn select_latest(mut sessions: Vec<SessionFile>) -> Vec<SessionFile> {
    sessions.sort_by(|a, b| b.modified.cmp(&a.modified));
    for (i, session) in sessions.iter_mut().enumerate() {
        session.is_latest = i == 0;
    }
    sessions
}
