//! TestWorld pattern for declarative integration test setup.
//!
//! Provides an isolated layout:
//! - `<tmp>/work/project`: the project working tree the agent edited
//! - `<tmp>/logs`: log root, with `<tmp>/logs/<project-key>` for the project
//! - `<tmp>/data`: agrewind data directory (ledger, config)

use anyhow::Result;
use filetime::FileTime;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::log_builder::SessionLogBuilder;

/// Declarative test environment builder.
///
/// # Example
/// ```no_run
/// use agrewind_testing::{SessionLogBuilder, TestWorld};
///
/// let world = TestWorld::new();
/// let target = world.project_file("notes.txt");
/// world
///     .write_session(
///         "s1",
///         &SessionLogBuilder::new("s1").user("add notes").write(&target, "hi\n"),
///     )
///     .unwrap();
/// ```
pub struct TestWorld {
    temp_dir: TempDir,
    project_dir: PathBuf,
    log_root: PathBuf,
    data_dir: PathBuf,
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl TestWorld {
    /// Create a new isolated test environment.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let base_path = temp_dir.path().to_path_buf();
        let project_dir = base_path.join("work").join("project");
        let log_root = base_path.join("logs");
        let data_dir = base_path.join("data");

        std::fs::create_dir_all(&project_dir).expect("Failed to create project dir");
        std::fs::create_dir_all(&log_root).expect("Failed to create log dir");
        std::fs::create_dir_all(&data_dir).expect("Failed to create data dir");

        Self {
            temp_dir,
            project_dir,
            log_root,
            data_dir,
        }
    }

    pub fn temp_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    pub fn log_root(&self) -> &Path {
        &self.log_root
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.data_dir.join("ledger.db")
    }

    /// Log directory of this world's project (`<log_root>/<project-key>`).
    pub fn project_log_dir(&self) -> PathBuf {
        let key = agrewind_core::project_key(&self.project_dir);
        agrewind_core::project_log_dir(&self.log_root, &key)
    }

    /// Absolute path (as the agent would log it) of a file in the project.
    pub fn project_file(&self, relative: &str) -> String {
        self.project_dir.join(relative).to_string_lossy().into_owned()
    }

    pub fn write_project_file(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.project_dir.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        std::fs::write(&path, content).expect("Failed to write project file");
        path
    }

    /// Current content of a project file, `None` if it does not exist.
    pub fn read_project_file(&self, relative: &str) -> Option<String> {
        std::fs::read_to_string(self.project_dir.join(relative)).ok()
    }

    /// Write a session log into the project's log directory.
    pub fn write_session(&self, session_id: &str, log: &SessionLogBuilder) -> Result<PathBuf> {
        let path = self.project_log_dir().join(format!("{session_id}.jsonl"));
        log.write_to(&path)?;
        Ok(path)
    }

    /// Pin a session log's modification time to `unix_secs`.
    pub fn set_session_mtime(&self, session_id: &str, unix_secs: i64) -> Result<()> {
        let path = self.project_log_dir().join(format!("{session_id}.jsonl"));
        filetime::set_file_mtime(&path, FileTime::from_unix_time(unix_secs, 0))?;
        Ok(())
    }
}
