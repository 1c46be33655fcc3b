//! Per-run history and statistics records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Terminal status of a sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Success,
    Error,
}

/// Counters accumulated during a run.
///
/// Only files that were actually written count as synced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatistics {
    pub total_synced_files: usize,
    pub new_files: usize,
    pub changed_files: usize,
    pub unchanged_files: usize,
    /// Conflicts seen, however they were resolved
    pub conflicts: usize,
    /// Files left as they were on the host: conflicts resolved in its
    /// favor plus host-only edits
    pub kept_host: usize,
    pub total_bytes: u64,
    pub duration_ms: u64,
}

/// Immutable record of one sync run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: Uuid,
    pub project_name: String,
    pub timestamp: DateTime<Utc>,
    pub status: SyncStatus,
    /// Paths written to the host, in processing order
    pub files: Vec<String>,
    pub statistics: SyncStatistics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HistoryEntry {
    pub fn is_success(&self) -> bool {
        self.status == SyncStatus::Success
    }
}

/// Compact per-run statistics sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsEntry {
    pub timestamp: DateTime<Utc>,
    pub status: SyncStatus,
    pub total_files: usize,
    pub new_files: usize,
    pub changed_files: usize,
    pub total_bytes: u64,
    pub duration_ms: u64,
}

impl From<&HistoryEntry> for StatsEntry {
    fn from(entry: &HistoryEntry) -> Self {
        Self {
            timestamp: entry.timestamp,
            status: entry.status,
            total_files: entry.statistics.total_synced_files,
            new_files: entry.statistics.new_files,
            changed_files: entry.statistics.changed_files,
            total_bytes: entry.statistics.total_bytes,
            duration_ms: entry.statistics.duration_ms,
        }
    }
}
