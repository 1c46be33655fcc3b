//! Watcher event feed

use serde::{Deserialize, Serialize};

use crate::Result;

/// A change reported by the project filesystem watcher.
///
/// Deserialized from `{"kind": "...", "path": "...", "buffer": [...]}`
/// payloads; unknown kinds fail at the boundary instead of being passed
/// through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum WatcherEvent {
    AddFile {
        path: String,
        #[serde(default)]
        buffer: Option<Vec<u8>>,
    },
    Change {
        path: String,
        #[serde(default)]
        buffer: Option<Vec<u8>>,
    },
    RemoveFile {
        path: String,
    },
    AddDir {
        path: String,
    },
    RemoveDir {
        path: String,
    },
    /// Emitted by some watchers after bulk changes; carries no information
    /// the table uses and is ignored.
    UpdateDirectory {
        path: String,
    },
}

impl WatcherEvent {
    /// Parse a JSON watcher payload.
    pub fn parse(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn path(&self) -> &str {
        match self {
            Self::AddFile { path, .. }
            | Self::Change { path, .. }
            | Self::RemoveFile { path }
            | Self::AddDir { path }
            | Self::RemoveDir { path }
            | Self::UpdateDirectory { path } => path,
        }
    }

    pub fn add_file(path: impl Into<String>, content: &str) -> Self {
        Self::AddFile {
            path: path.into(),
            buffer: Some(content.as_bytes().to_vec()),
        }
    }

    pub fn change(path: impl Into<String>, content: &str) -> Self {
        Self::Change {
            path: path.into(),
            buffer: Some(content.as_bytes().to_vec()),
        }
    }
}
