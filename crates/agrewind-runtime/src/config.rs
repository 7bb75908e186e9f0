use crate::{Error, Result};
use agrewind_core::{expand_tilde, resolve_data_dir, resolve_log_root};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_SNIPPET_LENGTH: usize = 100;
pub const LEDGER_FILE_NAME: &str = "ledger.db";
pub const CONFIG_FILE_NAME: &str = "config.toml";

fn default_snippet_length() -> usize {
    DEFAULT_SNIPPET_LENGTH
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding one log directory per project.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_root: Option<String>,
    /// Location of the revert ledger database.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ledger_path: Option<String>,
    /// Maximum length of the first-message snippet in session listings.
    #[serde(default = "default_snippet_length")]
    pub snippet_length: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_root: None,
            ledger_path: None,
            snippet_length: DEFAULT_SNIPPET_LENGTH,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::default_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| Error::io(path, e))?;
        Ok(())
    }

    pub fn default_path() -> Result<PathBuf> {
        Ok(resolve_data_dir(None)?.join(CONFIG_FILE_NAME))
    }

    /// Log root from config, `CLAUDE_CONFIG_DIR`, or the home directory.
    pub fn resolved_log_root(&self) -> Result<PathBuf> {
        Ok(resolve_log_root(self.log_root.as_deref())?)
    }

    /// Ledger path from config, else `<data_dir>/ledger.db`.
    pub fn resolved_ledger_path(&self) -> Result<PathBuf> {
        match &self.ledger_path {
            Some(path) => Ok(expand_tilde(path)),
            None => Ok(resolve_data_dir(None)?.join(LEDGER_FILE_NAME)),
        }
    }
}
