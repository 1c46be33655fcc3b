//! Sync engine: mirrors the virtual file table into a host directory

use std::sync::Arc;

use chrono::Utc;
use tokio::time::Instant;
use uuid::Uuid;

use super::exclude::ExcludeMatcher;
use super::known::{FileAction, KnownStateCache, classify_change};
use super::report::{HistoryEntry, SyncStatistics, SyncStatus};
use super::resolver::{ConflictDecision, ConflictResolver, FixedResolver, SyncConflict};
use crate::backend::{HostDirectory, read_relative, write_relative};
use crate::config::{ConflictPolicy, SyncSettings};
use crate::session::SyncSession;
use crate::vfs::VirtualFileTable;
use crate::{Error, Result};

/// Counters and written paths of the run in progress. Survives an
/// aborted run so the history entry reflects exactly what was written.
#[derive(Debug, Default)]
struct RunState {
    statistics: SyncStatistics,
    files: Vec<String>,
}

impl RunState {
    fn wrote(&mut self, relative: &str, content: &str) {
        self.statistics.total_synced_files += 1;
        self.statistics.total_bytes += content.len() as u64;
        self.files.push(relative.to_string());
    }
}

/// Mirrors project files into a host directory under a three-way
/// conflict policy.
///
/// The engine exclusively owns the known-state cache. Files are processed
/// one at a time; the first I/O failure ends the run.
pub struct SyncEngine {
    known: KnownStateCache,
    resolver: Arc<dyn ConflictResolver>,
    last_started: Option<Instant>,
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("known", &self.known.len())
            .field("last_started", &self.last_started)
            .finish()
    }
}

impl SyncEngine {
    pub fn new(resolver: Arc<dyn ConflictResolver>) -> Self {
        Self {
            known: KnownStateCache::new(),
            resolver,
            last_started: None,
        }
    }

    /// Engine whose `ask` conflicts always keep the host version.
    pub fn headless() -> Self {
        Self::new(Arc::new(FixedResolver(ConflictDecision::KeepHost)))
    }

    /// Seed the known states, e.g. from a previous process.
    pub fn with_known_states(mut self, known: KnownStateCache) -> Self {
        self.known = known;
        self
    }

    pub fn known_states(&self) -> &KnownStateCache {
        &self.known
    }

    /// Forget every known state; the next run treats all files as first
    /// encounters.
    pub fn reset_known_states(&mut self) {
        tracing::info!(cleared = self.known.len(), "known states reset");
        self.known.clear();
    }

    pub fn set_resolver(&mut self, resolver: Arc<dyn ConflictResolver>) {
        self.resolver = resolver;
    }

    /// Run one sync of `table` into the session's project folder under
    /// `host`.
    ///
    /// Returns `Err` only when the run could not start (bad exclude
    /// pattern, guard interval not elapsed). Once started, a run always
    /// yields a [`HistoryEntry`], with `Error` status if it was aborted,
    /// and the entry is recorded in `session`.
    pub async fn sync(
        &mut self,
        table: &VirtualFileTable,
        host: &dyn HostDirectory,
        session: &mut SyncSession,
        settings: &SyncSettings,
    ) -> Result<HistoryEntry> {
        let excludes = ExcludeMatcher::new(&settings.exclude_patterns)?;

        let now = Instant::now();
        if let Some(last) = self.last_started {
            let elapsed = now.duration_since(last);
            if elapsed < settings.sync_guard() {
                let elapsed_ms = elapsed.as_millis() as u64;
                tracing::warn!(elapsed_ms, "sync requested during guard interval");
                return Err(Error::SyncThrottled { elapsed_ms });
            }
        }
        self.last_started = Some(now);

        let mut run = RunState::default();
        let outcome = self
            .run(table, host, &session.project_folder_name, settings, &excludes, &mut run)
            .await;

        run.statistics.duration_ms = now.elapsed().as_millis() as u64;
        let (status, error) = match outcome {
            Ok(()) => (SyncStatus::Success, None),
            Err(e) => {
                tracing::warn!(error = %e, written = run.files.len(), "sync aborted");
                (SyncStatus::Error, Some(e.to_string()))
            }
        };

        let entry = HistoryEntry {
            id: Uuid::new_v4(),
            project_name: session.project_name.clone(),
            timestamp: Utc::now(),
            status,
            files: run.files,
            statistics: run.statistics,
            error,
        };
        tracing::info!(
            project = %entry.project_name,
            status = ?entry.status,
            synced = entry.statistics.total_synced_files,
            new = entry.statistics.new_files,
            changed = entry.statistics.changed_files,
            conflicts = entry.statistics.conflicts,
            bytes = entry.statistics.total_bytes,
            "sync finished"
        );
        session.record(entry.clone());
        Ok(entry)
    }

    async fn run(
        &mut self,
        table: &VirtualFileTable,
        host: &dyn HostDirectory,
        folder_name: &str,
        settings: &SyncSettings,
        excludes: &ExcludeMatcher,
        run: &mut RunState,
    ) -> Result<()> {
        let folder = host
            .directory(folder_name, true)
            .await
            .map_err(|e| Error::io(folder_name, e))?
            .ok_or_else(|| Error::NotFound {
                path: folder_name.to_string(),
            })?;

        let files: Vec<(String, &str)> = table
            .text_files()
            .filter(|(relative, _)| !excludes.is_excluded(relative))
            .collect();

        for (relative, local) in files {
            let host_content = read_relative(folder.as_ref(), &relative)
                .await
                .map_err(|e| Error::io(relative.as_str(), e))?;
            let action = classify_change(local, host_content.as_deref(), self.known.get(&relative));
            tracing::debug!(path = %relative, ?action, "classified");

            match (action, host_content) {
                (FileAction::Create, _) => {
                    self.write(folder.as_ref(), &relative, local, run).await?;
                    run.statistics.new_files += 1;
                }
                (FileAction::Overwrite, _) => {
                    self.write(folder.as_ref(), &relative, local, run).await?;
                    run.statistics.changed_files += 1;
                }
                (FileAction::Unchanged, _) => {
                    self.known.record(&relative, local, local);
                    run.statistics.unchanged_files += 1;
                }
                (FileAction::HostAhead, Some(host_content)) => {
                    self.known.record(&relative, &host_content, local);
                    run.statistics.kept_host += 1;
                }
                (FileAction::Conflict, Some(host_content)) => {
                    run.statistics.conflicts += 1;
                    let conflict = SyncConflict {
                        path: relative.clone(),
                        local: local.to_string(),
                        host: host_content,
                        known: self.known.get(&relative).map(|k| k.content.clone()),
                    };
                    match self.decide(&conflict, settings).await {
                        ConflictDecision::UseLocal => {
                            self.write(folder.as_ref(), &relative, local, run).await?;
                            run.statistics.changed_files += 1;
                        }
                        ConflictDecision::KeepHost => {
                            self.known.record(&relative, &conflict.host, local);
                            run.statistics.kept_host += 1;
                        }
                    }
                }
                // classify_change only reports these when the host file exists
                (FileAction::HostAhead | FileAction::Conflict, None) => {}
            }
        }
        Ok(())
    }

    /// Write local content to the host, then record it as known.
    async fn write(
        &mut self,
        folder: &dyn HostDirectory,
        relative: &str,
        content: &str,
        run: &mut RunState,
    ) -> Result<()> {
        write_relative(folder, relative, content)
            .await
            .map_err(|e| Error::io(relative, e))?;
        self.known.record(relative, content, content);
        run.wrote(relative, content);
        Ok(())
    }

    async fn decide(&self, conflict: &SyncConflict, settings: &SyncSettings) -> ConflictDecision {
        match settings.conflict_policy {
            ConflictPolicy::Force => ConflictDecision::UseLocal,
            ConflictPolicy::Skip => ConflictDecision::KeepHost,
            ConflictPolicy::Ask => {
                tracing::warn!(path = %conflict.path, "conflict, waiting for decision");
                let pending = self.resolver.resolve(conflict);
                match tokio::time::timeout(settings.decision_timeout(), pending).await {
                    Ok(Ok(decision)) => decision,
                    Ok(Err(e)) => {
                        tracing::warn!(path = %conflict.path, error = %e, default = ?settings.default_decision, "no decision, using default");
                        settings.default_decision
                    }
                    Err(_) => {
                        tracing::warn!(path = %conflict.path, default = ?settings.default_decision, "decision timed out, using default");
                        settings.default_decision
                    }
                }
            }
        }
    }
}
