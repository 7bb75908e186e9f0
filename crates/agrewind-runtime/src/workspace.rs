use agrewind_core::{project_key, project_log_dir};
use agrewind_engine::{attach_parsed_changes, build_turns, sort_newest_first};
use agrewind_providers::{list_session_files, read_entries, select_latest, session_summary};
use agrewind_types::{
    ConversationTurn, ParsedChange, RevertOutcome, RevertRecord, SessionFile, SessionMetadata,
    SessionSummary, SessionTurns,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Config;
use crate::revert::RevertEngine;
use crate::scan::ScanInterrupt;
use crate::{Error, Result};

/// Synchronous entry point over one project's sessions and the revert ledger.
pub struct Workspace {
    config: Config,
    project_root: PathBuf,
    log_dir: PathBuf,
    engine: Arc<RevertEngine>,
}

impl Workspace {
    pub fn open(config: Config, project_root: &Path) -> Result<Self> {
        let log_root = config.resolved_log_root()?;
        let log_dir = project_log_dir(&log_root, &project_key(project_root));
        let engine = RevertEngine::open(&config.resolved_ledger_path()?)?;

        tracing::debug!(log_dir = %log_dir.display(), "workspace opened");

        Ok(Self {
            config,
            project_root: project_root.to_path_buf(),
            log_dir,
            engine: Arc::new(engine),
        })
    }

    /// Open with the config file from the data directory and the discovered
    /// project root.
    pub fn open_default(explicit_project_root: Option<&str>) -> Result<Self> {
        let config = Config::load()?;
        let root = agrewind_core::discover_project_root(explicit_project_root)?;
        Self::open(config, &root)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn project_log_dir(&self) -> &Path {
        &self.log_dir
    }

    pub fn engine(&self) -> &Arc<RevertEngine> {
        &self.engine
    }

    fn sessions(&self) -> Result<Vec<SessionFile>> {
        Ok(select_latest(list_session_files(&self.log_dir)?))
    }

    fn find_session(&self, session_id: &str) -> Result<SessionFile> {
        self.sessions()?
            .into_iter()
            .find(|s| s.id == session_id)
            .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))
    }

    /// Sessions newest first, with a cheap one-pass summary each.
    ///
    /// A log that cannot be read is still listed, with an empty summary.
    pub fn list_sessions(&self, interrupt: &ScanInterrupt) -> Result<Vec<SessionMetadata>> {
        let sessions = self.sessions()?;
        let mut listed = Vec::with_capacity(sessions.len());

        for session in &sessions {
            if interrupt.is_tripped() {
                tracing::debug!(scanned = listed.len(), "session scan interrupted");
                return Err(Error::Interrupted);
            }
            let summary = match session_summary(&session.path, self.config.snippet_length) {
                Ok(summary) => summary,
                Err(err) => {
                    tracing::warn!(
                        session = %session.id,
                        path = %session.path.display(),
                        error = %err,
                        "session log unreadable, listing without summary"
                    );
                    SessionSummary::default()
                }
            };
            listed.push(SessionMetadata::new(session, summary));
        }

        Ok(listed)
    }

    fn load_turns(&self, session: &SessionFile) -> Result<Vec<ConversationTurn>> {
        let entries = read_entries(&session.path)?;
        Ok(build_turns(&session.id, entries))
    }

    fn process(&self, session: &SessionFile, turns: &[ConversationTurn]) -> Vec<ParsedChange> {
        self.engine.process_session_changes(
            session,
            turns.iter().flat_map(|turn| turn.attributed_changes()),
        )
    }

    pub fn get_session_turns(&self, session_id: &str) -> Result<SessionTurns> {
        let session = self.find_session(session_id)?;
        let turns = self.load_turns(&session)?;
        let parsed = self.process(&session, &turns);

        Ok(SessionTurns {
            turns: attach_parsed_changes(turns, parsed),
            session,
        })
    }

    /// Every change of a session, newest first.
    pub fn get_session_changes(&self, session_id: &str) -> Result<Vec<ParsedChange>> {
        let session = self.find_session(session_id)?;
        self.session_changes(&session)
    }

    fn session_changes(&self, session: &SessionFile) -> Result<Vec<ParsedChange>> {
        let turns = self.load_turns(session)?;
        let mut parsed = self.process(session, &turns);
        sort_newest_first(&mut parsed);
        Ok(parsed)
    }

    pub fn revert_change(&self, change_id: &str) -> Result<RevertOutcome> {
        let sessions = self.sessions()?;
        let latest = sessions.iter().find(|s| s.is_latest);

        // Process the latest session so its changes are cached with current recency.
        if let Some(latest) = latest {
            self.session_changes(latest)?;
        }

        if self.engine.cached_change(change_id).is_none()
            && let Some(owner) = sessions
                .iter()
                .filter(|s| change_id.starts_with(&format!("{}-", s.id)))
                .max_by_key(|s| s.id.len())
        {
            self.session_changes(owner)?;
        }

        let (session_id, mut change) = self
            .engine
            .cached_change(change_id)
            .ok_or_else(|| Error::ChangeNotFound(change_id.to_string()))?;

        change.is_latest_session = latest.is_some_and(|l| l.id == session_id);
        self.engine.revert(&change)
    }

    pub fn reverted_changes(&self) -> Result<Vec<RevertRecord>> {
        self.engine.reverted_changes()
    }
}
