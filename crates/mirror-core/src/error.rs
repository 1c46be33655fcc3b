//! Error types for mirror-core

use mirror_fs::ProtectedPath;
use uuid::Uuid;

/// Result type for mirror-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in mirror-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Path does not resolve to a location under the project root
    #[error("Path is not under the project root: {path}")]
    InvalidPath { path: String },

    /// A file operation targeted a folder
    #[error("Expected a file but found a folder: {path}")]
    NotAFile { path: String },

    /// Operation target is absent
    #[error("Not found: {path}")]
    NotFound { path: String },

    /// Create/rename target already exists
    #[error("Already exists: {path}")]
    AlreadyExists { path: String },

    /// Path lies in a protected subtree
    #[error("Operation blocked: {path} is inside protected path {subtree}")]
    OperationBlocked { path: String, subtree: ProtectedPath },

    /// Underlying filesystem failure on the virtual or host side
    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Diff requested on binary content
    #[error("Binary content cannot be diffed: {path}")]
    BinaryUnsupported { path: String },

    /// A conflict could not be handed to a decision maker
    #[error("Sync conflict on {path} could not be resolved")]
    SyncConflict { path: String },

    /// A sync run was requested too soon after the previous one started
    #[error("Sync refused: previous run started {elapsed_ms}ms ago")]
    SyncThrottled { elapsed_ms: u64 },

    /// No project is open
    #[error("No active sync session")]
    NoActiveSession,

    /// The handle does not belong to the active session
    #[error("Session {id} is not the active session")]
    SessionMismatch { id: Uuid },

    /// An exclude pattern failed to compile
    #[error("Invalid exclude pattern '{pattern}': {message}")]
    InvalidExcludePattern { pattern: String, message: String },

    /// Watcher payload that does not match any known event kind
    #[error("Malformed watcher event: {0}")]
    MalformedEvent(#[from] serde_json::Error),

    /// Filesystem error from mirror-fs
    #[error(transparent)]
    Fs(#[from] mirror_fs::Error),
}

/// Coarse classification of an [`Error`], stable for callers that need to
/// explain a failure without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidPath,
    NotFound,
    AlreadyExists,
    OperationBlocked,
    IoError,
    BinaryUnsupported,
    SyncConflict,
    Throttled,
    Session,
    Config,
}

impl Error {
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidPath { .. } | Self::NotAFile { .. } => ErrorKind::InvalidPath,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            Self::OperationBlocked { .. } => ErrorKind::OperationBlocked,
            Self::Io { .. } | Self::Fs(mirror_fs::Error::Io { .. }) => ErrorKind::IoError,
            Self::BinaryUnsupported { .. } => ErrorKind::BinaryUnsupported,
            Self::SyncConflict { .. } => ErrorKind::SyncConflict,
            Self::SyncThrottled { .. } => ErrorKind::Throttled,
            Self::NoActiveSession | Self::SessionMismatch { .. } => ErrorKind::Session,
            Self::InvalidExcludePattern { .. } | Self::MalformedEvent(_) | Self::Fs(_) => {
                ErrorKind::Config
            }
        }
    }
}
