//! Sync sessions and project name normalization

use std::collections::BTreeSet;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use uuid::Uuid;

use crate::sync::{HistoryEntry, StatsEntry, SyncStatus};
use crate::{Error, Result};

/// Trailing disambiguation added when the same project is opened or
/// copied again: `name (2)`, `name-3`, `name_4`. A number after plain
/// whitespace is part of the name (`Python 3`).
static DISAMBIGUATION_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\s*\(\d+\)|[-_]\d+)$").unwrap());

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Normalize a project name into the key its settings are stored under.
///
/// Lower-cases, strips a trailing disambiguation suffix, drops
/// punctuation other than `_`, and collapses whitespace runs to a single
/// underscore.
pub fn normalize_project_name(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    let stripped = DISAMBIGUATION_SUFFIX.replace(&lowered, "");
    let cleaned: String = stripped
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '_')
        .collect();
    WHITESPACE
        .replace_all(cleaned.trim(), "_")
        .trim_matches('_')
        .to_string()
}

/// Host folder name for a project that has none configured.
pub fn default_folder_name(project_name: &str) -> String {
    let normalized = normalize_project_name(project_name);
    if normalized.is_empty() {
        "project".to_string()
    } else {
        normalized
    }
}

/// State of the sync runs for one open project.
#[derive(Debug, Clone)]
pub struct SyncSession {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub last_sync_at: Option<DateTime<Utc>>,
    /// Every path written to the host during this session
    pub synced_paths: BTreeSet<String>,
    pub history: Vec<HistoryEntry>,
    pub statistics: Vec<StatsEntry>,
    pub project_name: String,
    pub project_folder_name: String,
}

impl SyncSession {
    pub fn new(project_name: impl Into<String>, project_folder_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            last_sync_at: None,
            synced_paths: BTreeSet::new(),
            history: Vec::new(),
            statistics: Vec::new(),
            project_name: project_name.into(),
            project_folder_name: project_folder_name.into(),
        }
    }

    /// Append a finished run.
    pub fn record(&mut self, entry: HistoryEntry) {
        if entry.status == SyncStatus::Success {
            self.last_sync_at = Some(entry.timestamp);
        }
        self.synced_paths.extend(entry.files.iter().cloned());
        self.statistics.push(StatsEntry::from(&entry));
        self.history.push(entry);
    }

    pub fn last_entry(&self) -> Option<&HistoryEntry> {
        self.history.last()
    }
}

/// Opaque reference to the session opened for a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionHandle(Uuid);

impl SessionHandle {
    pub fn id(&self) -> Uuid {
        self.0
    }
}

/// Owner of the single active session.
#[derive(Debug, Default)]
pub struct SessionManager {
    active: Option<SyncSession>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session for a project, discarding any previous one.
    pub fn open(&mut self, project_name: &str, folder_name: &str) -> SessionHandle {
        let session = SyncSession::new(project_name, folder_name);
        let handle = SessionHandle(session.id);
        if let Some(previous) = self.active.replace(session) {
            tracing::info!(
                previous = %previous.project_name,
                runs = previous.history.len(),
                "replacing sync session"
            );
        }
        tracing::info!(project = project_name, folder = folder_name, id = %handle.0, "sync session opened");
        handle
    }

    /// End the session `handle` refers to and hand it back.
    pub fn close(&mut self, handle: SessionHandle) -> Result<SyncSession> {
        self.session_mut(handle)?;
        let session = self.active.take().ok_or(Error::NoActiveSession)?;
        tracing::info!(project = %session.project_name, id = %session.id, "sync session closed");
        Ok(session)
    }

    pub fn active(&self) -> Option<&SyncSession> {
        self.active.as_ref()
    }

    pub fn active_mut(&mut self) -> Option<&mut SyncSession> {
        self.active.as_mut()
    }

    /// The active session, provided `handle` still refers to it.
    pub fn session_mut(&mut self, handle: SessionHandle) -> Result<&mut SyncSession> {
        match self.active.as_mut() {
            None => Err(Error::NoActiveSession),
            Some(session) if session.id != handle.0 => Err(Error::SessionMismatch { id: handle.0 }),
            Some(session) => Ok(session),
        }
    }
}
