use std::fmt;
use std::path::PathBuf;

/// Result type for agrewind-runtime operations
pub type Result<T> = std::result::Result<T, Error>;

/// Why a revert was refused before touching the filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevertRejected {
    /// The ledger already records this change as reverted.
    AlreadyReverted(String),
    /// The change belongs to a session that is no longer the most recent one.
    NotLatestSession(String),
    /// The change could not be simulated, so there is no trustworthy snapshot.
    Unrevertable { change_id: String, reason: String },
}

impl RevertRejected {
    pub fn change_id(&self) -> &str {
        match self {
            RevertRejected::AlreadyReverted(id) | RevertRejected::NotLatestSession(id) => id,
            RevertRejected::Unrevertable { change_id, .. } => change_id,
        }
    }
}

impl fmt::Display for RevertRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RevertRejected::AlreadyReverted(id) => write!(f, "change {} was already reverted", id),
            RevertRejected::NotLatestSession(id) => write!(
                f,
                "change {} belongs to an older session; only the latest session can be reverted",
                id
            ),
            RevertRejected::Unrevertable { change_id, reason } => {
                write!(f, "change {} cannot be reverted: {}", change_id, reason)
            }
        }
    }
}

/// Error types that can occur in the runtime layer
#[derive(Debug)]
pub enum Error {
    /// No session log with this id in the project
    SessionNotFound(String),

    /// No change with this id in the project's sessions
    ChangeNotFound(String),

    /// Revert refused, nothing was changed
    Rejected(RevertRejected),

    /// Filesystem operation on a target file failed
    Io { path: PathBuf, source: std::io::Error },

    /// Revert ledger error
    Ledger(agrewind_index::Error),

    /// Provider layer error (session discovery, log reading)
    Provider(agrewind_providers::Error),

    /// Configuration error
    Config(String),

    /// A scan was interrupted before completion
    Interrupted,

    /// A blocking task failed to complete
    Task(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::SessionNotFound(id) => write!(f, "Session not found: {}", id),
            Error::ChangeNotFound(id) => write!(f, "Change not found: {}", id),
            Error::Rejected(reason) => write!(f, "Revert rejected: {}", reason),
            Error::Io { path, source } => write!(f, "IO error on {}: {}", path.display(), source),
            Error::Ledger(err) => write!(f, "Ledger error: {}", err),
            Error::Provider(err) => write!(f, "Provider error: {}", err),
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::Interrupted => write!(f, "Scan interrupted"),
            Error::Task(msg) => write!(f, "Background task failed: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io { source, .. } => Some(source),
            Error::Ledger(err) => Some(err),
            Error::Provider(err) => Some(err),
            Error::SessionNotFound(_)
            | Error::ChangeNotFound(_)
            | Error::Rejected(_)
            | Error::Config(_)
            | Error::Interrupted
            | Error::Task(_) => None,
        }
    }
}

impl From<RevertRejected> for Error {
    fn from(reason: RevertRejected) -> Self {
        Error::Rejected(reason)
    }
}

impl From<agrewind_index::Error> for Error {
    fn from(err: agrewind_index::Error) -> Self {
        Error::Ledger(err)
    }
}

impl From<agrewind_providers::Error> for Error {
    fn from(err: agrewind_providers::Error) -> Self {
        Error::Provider(err)
    }
}

impl From<agrewind_core::Error> for Error {
    fn from(err: agrewind_core::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Config(err.to_string())
    }
}
