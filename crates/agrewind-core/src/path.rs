use agrewind_types::ProjectKey;
use std::path::{Path, PathBuf};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Config(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(err) => write!(f, "IO error: {}", err),
            Error::Config(msg) => write!(f, "Config error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Config(_) => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

/// Characters the agent's log storage replaces with [`KEY_FILLER`] when
/// naming a project directory.
pub const KEY_ESCAPED_CHARS: [char; 6] = ['/', '\\', '.', ':', '_', ' '];

pub const KEY_FILLER: char = '-';

/// Resolve the agrewind data directory (ledger, config) based on priority:
/// 1. Explicit path (with tilde expansion)
/// 2. AGREWIND_PATH environment variable (with tilde expansion)
/// 3. System data directory
/// 4. ~/.agrewind
pub fn resolve_data_dir(explicit_path: Option<&str>) -> Result<PathBuf> {
    if let Some(path) = explicit_path {
        return Ok(expand_tilde(path));
    }

    if let Ok(env_path) = std::env::var("AGREWIND_PATH") {
        return Ok(expand_tilde(&env_path));
    }

    if let Some(data_dir) = dirs::data_dir() {
        return Ok(data_dir.join("agrewind"));
    }

    if let Some(home) = std::env::var_os("HOME") {
        return Ok(PathBuf::from(home).join(".agrewind"));
    }

    Err(Error::Config(
        "Could not determine data directory: no HOME directory or system data directory found"
            .to_string(),
    ))
}

/// Resolve the directory holding one sub-directory per project:
/// 1. Explicit path (with tilde expansion)
/// 2. CLAUDE_CONFIG_DIR environment variable + `/projects`
/// 3. ~/.claude/projects
pub fn resolve_log_root(explicit_path: Option<&str>) -> Result<PathBuf> {
    if let Some(path) = explicit_path {
        return Ok(expand_tilde(path));
    }

    if let Ok(config_dir) = std::env::var("CLAUDE_CONFIG_DIR") {
        return Ok(expand_tilde(&config_dir).join("projects"));
    }

    if let Some(home) = dirs::home_dir() {
        return Ok(home.join(".claude").join("projects"));
    }

    Err(Error::Config(
        "Could not determine log root: no HOME directory found".to_string(),
    ))
}

/// Expand tilde (~) in paths to the user's home directory
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/")
        && let Some(home) = std::env::var_os("HOME")
    {
        return PathBuf::from(home).join(stripped);
    }
    PathBuf::from(path)
}

/// Discover project root based on priority:
/// 1. explicit_project_root
/// 2. AGREWIND_PROJECT_ROOT environment variable
/// 3. Current working directory
pub fn discover_project_root(explicit_project_root: Option<&str>) -> Result<PathBuf> {
    if let Some(root) = explicit_project_root {
        return Ok(PathBuf::from(root));
    }

    if let Ok(env_root) = std::env::var("AGREWIND_PROJECT_ROOT") {
        return Ok(PathBuf::from(env_root));
    }

    let cwd = std::env::current_dir()?;
    Ok(cwd)
}

/// Escape a project root into the log storage's directory name.
///
/// Every path separator and each character of [`KEY_ESCAPED_CHARS`] becomes a
/// single [`KEY_FILLER`]; everything else is kept verbatim.
pub fn project_key(project_root: &Path) -> ProjectKey {
    let escaped: String = project_root
        .to_string_lossy()
        .chars()
        .map(|c| {
            if KEY_ESCAPED_CHARS.contains(&c) {
                KEY_FILLER
            } else {
                c
            }
        })
        .collect();
    ProjectKey::new(escaped)
}

/// Project key of the discovered project root.
pub fn current_project_key(explicit_project_root: Option<&str>) -> Result<ProjectKey> {
    let root = discover_project_root(explicit_project_root)?;
    Ok(project_key(&root))
}

/// Directory holding the sessions of `key` under `log_root`.
pub fn project_log_dir(log_root: &Path, key: &ProjectKey) -> PathBuf {
    log_root.join(key.as_str())
}
