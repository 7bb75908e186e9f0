use agrewind_types::{ParsedChange, RevertOutcome, RevertRecord, SessionMetadata, SessionTurns};
use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::scan::ScanInterrupt;
use crate::workspace::Workspace;
use crate::{Error, Result};

/// Async handle over a [`Workspace`] for the transport layer.
///
/// Every call runs on the blocking pool. Dropping a pending `list_sessions`
/// future interrupts its scan.
#[derive(Clone)]
pub struct Client {
    inner: Arc<Workspace>,
}

impl Client {
    pub fn new(workspace: Workspace) -> Self {
        Self {
            inner: Arc::new(workspace),
        }
    }

    pub fn open(config: Config, project_root: &Path) -> Result<Self> {
        Ok(Self::new(Workspace::open(config, project_root)?))
    }

    pub fn workspace(&self) -> &Workspace {
        &self.inner
    }

    async fn run<T, F>(&self, task: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Workspace) -> Result<T> + Send + 'static,
    {
        let workspace = self.inner.clone();
        tokio::task::spawn_blocking(move || task(&workspace))
            .await
            .map_err(|e| Error::Task(e.to_string()))?
    }

    pub async fn list_sessions(&self) -> Result<Vec<SessionMetadata>> {
        let interrupt = ScanInterrupt::new();
        let _interrupt_guard = interrupt.trip_on_drop();
        self.run(move |ws| ws.list_sessions(&interrupt)).await
    }

    pub async fn get_session_turns(&self, session_id: &str) -> Result<SessionTurns> {
        let session_id = session_id.to_string();
        self.run(move |ws| ws.get_session_turns(&session_id)).await
    }

    pub async fn get_session_changes(&self, session_id: &str) -> Result<Vec<ParsedChange>> {
        let session_id = session_id.to_string();
        self.run(move |ws| ws.get_session_changes(&session_id)).await
    }

    pub async fn revert_change(&self, change_id: &str) -> Result<RevertOutcome> {
        let change_id = change_id.to_string();
        self.run(move |ws| ws.revert_change(&change_id)).await
    }

    pub async fn reverted_changes(&self) -> Result<Vec<RevertRecord>> {
        self.run(|ws| ws.reverted_changes()).await
    }
}
