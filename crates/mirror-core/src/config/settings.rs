//! Process-wide sync settings with per-project enablement

use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use mirror_fs::{ConfigStore, NormalizedPath};
use serde::{Deserialize, Serialize};

use crate::session::{default_folder_name, normalize_project_name};
use crate::sync::ConflictDecision;
use crate::Result;

/// What to do when local and host content diverged since the last sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Hand the conflict to the resolver
    #[default]
    Ask,
    /// Always overwrite the host with local content
    Force,
    /// Leave the host file untouched
    Skip,
}

impl ConflictPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ask => "ask",
            Self::Force => "force",
            Self::Skip => "skip",
        }
    }
}

impl std::fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConflictPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ask" => Ok(Self::Ask),
            "force" => Ok(Self::Force),
            "skip" => Ok(Self::Skip),
            other => Err(format!(
                "unknown conflict policy '{other}' (expected ask, force or skip)"
            )),
        }
    }
}

/// Sync configuration for one project, keyed by its normalized name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSyncConfig {
    pub enabled: bool,
    /// Subfolder of the host directory the project mirrors into
    pub folder_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sync: Option<DateTime<Utc>>,
}

/// Settings shared by every session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    pub auto_sync: bool,
    pub auto_sync_interval_secs: u64,
    pub sync_on_save: bool,
    /// Gitignore-style patterns matched against project-relative paths
    pub exclude_patterns: Vec<String>,
    pub conflict_policy: ConflictPolicy,
    /// How long an `ask` decision may take before `default_decision` applies
    pub decision_timeout_secs: u64,
    pub default_decision: ConflictDecision,
    /// Minimum spacing between sync run starts
    pub sync_guard_ms: u64,
    /// Watcher batching window
    pub debounce_ms: u64,
    pub projects: BTreeMap<String, ProjectSyncConfig>,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            auto_sync: false,
            auto_sync_interval_secs: 300,
            sync_on_save: false,
            exclude_patterns: [
                "node_modules/",
                ".git/",
                ".DS_Store",
                "*.log",
                "dist/",
                "build/",
                ".cache/",
            ]
            .map(String::from)
            .to_vec(),
            conflict_policy: ConflictPolicy::Ask,
            decision_timeout_secs: 30,
            default_decision: ConflictDecision::KeepHost,
            sync_guard_ms: 1000,
            debounce_ms: 100,
            projects: BTreeMap::new(),
        }
    }
}

impl SyncSettings {
    /// Load settings, using defaults when the file does not exist.
    ///
    /// Format follows the extension (`.toml`, `.json`, `.yaml`).
    pub fn load(path: &NormalizedPath) -> Result<Self> {
        Ok(ConfigStore::new().load_or_default(path)?)
    }

    pub fn save(&self, path: &NormalizedPath) -> Result<()> {
        Ok(ConfigStore::new().save(path, self)?)
    }

    pub fn auto_sync_interval(&self) -> Duration {
        Duration::from_secs(self.auto_sync_interval_secs.max(1))
    }

    pub fn decision_timeout(&self) -> Duration {
        Duration::from_secs(self.decision_timeout_secs)
    }

    pub fn sync_guard(&self) -> Duration {
        Duration::from_millis(self.sync_guard_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Look up a project by any of its generated names.
    pub fn project(&self, project_name: &str) -> Option<&ProjectSyncConfig> {
        self.projects.get(&normalize_project_name(project_name))
    }

    pub fn is_project_enabled(&self, project_name: &str) -> bool {
        self.project(project_name).is_some_and(|p| p.enabled)
    }

    /// Host folder for a project: the configured one, else derived from
    /// the name.
    pub fn folder_name_for(&self, project_name: &str) -> String {
        self.project(project_name)
            .map(|p| p.folder_name.clone())
            .unwrap_or_else(|| default_folder_name(project_name))
    }

    /// Enable syncing for a project, keeping any existing folder name.
    pub fn enable_project(&mut self, project_name: &str, folder_name: Option<&str>) {
        let key = normalize_project_name(project_name);
        let config = self
            .projects
            .entry(key)
            .or_insert_with(|| ProjectSyncConfig {
                enabled: true,
                folder_name: default_folder_name(project_name),
                last_sync: None,
            });
        config.enabled = true;
        if let Some(folder) = folder_name {
            config.folder_name = folder.to_string();
        }
        tracing::info!(project = project_name, folder = %config.folder_name, "sync enabled");
    }

    pub fn disable_project(&mut self, project_name: &str) {
        if let Some(config) = self.projects.get_mut(&normalize_project_name(project_name)) {
            config.enabled = false;
            tracing::info!(project = project_name, "sync disabled");
        }
    }

    /// Stamp the project's last successful sync.
    pub fn record_sync(&mut self, project_name: &str, at: DateTime<Utc>) {
        if let Some(config) = self.projects.get_mut(&normalize_project_name(project_name)) {
            config.last_sync = Some(at);
        }
    }
}
