//! Owned facade over table, engine, sessions and settings

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock, mpsc};
use tokio::task::JoinHandle;

use crate::backend::HostDirectory;
use crate::config::SyncSettings;
use crate::session::{SessionHandle, SessionManager, SyncSession};
use crate::sync::{AutoSync, HistoryEntry, SyncEngine};
use crate::vfs::{VirtualFileTable, WatcherEvent, spawn_event_pump};
use crate::{Error, Result};

/// State shared between the workspace and its background tasks.
///
/// Locks are always taken in field order: settings, table, engine,
/// sessions.
#[derive(Clone)]
struct Shared {
    settings: Arc<RwLock<SyncSettings>>,
    table: Arc<RwLock<VirtualFileTable>>,
    engine: Arc<Mutex<SyncEngine>>,
    sessions: Arc<Mutex<SessionManager>>,
    host: Arc<dyn HostDirectory>,
}

impl Shared {
    async fn sync(&self) -> Result<HistoryEntry> {
        let settings = self.settings.read().await.clone();
        let table = self.table.read().await;
        let mut engine = self.engine.lock().await;
        let mut sessions = self.sessions.lock().await;
        let session = sessions.active_mut().ok_or(Error::NoActiveSession)?;

        let entry = engine
            .sync(&table, self.host.as_ref(), session, &settings)
            .await?;
        let project = session.project_name.clone();
        drop(sessions);
        drop(engine);
        drop(table);

        if entry.is_success() {
            self.settings
                .write()
                .await
                .record_sync(&project, entry.timestamp);
        }
        Ok(entry)
    }
}

/// One project mirrored into one host directory.
///
/// Construct once per process and pass it (or the handles it exposes) to
/// whatever needs it. Opening a project starts a session; closing it
/// ends the session and stops auto-sync.
pub struct Workspace {
    shared: Shared,
    session: Option<SessionHandle>,
    auto_sync: Option<AutoSync>,
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("session", &self.session)
            .field("auto_sync", &self.auto_sync)
            .finish()
    }
}

impl Workspace {
    pub fn new(
        table: VirtualFileTable,
        host: Arc<dyn HostDirectory>,
        settings: SyncSettings,
        engine: SyncEngine,
    ) -> Self {
        Self {
            shared: Shared {
                settings: Arc::new(RwLock::new(settings)),
                table: Arc::new(RwLock::new(table)),
                engine: Arc::new(Mutex::new(engine)),
                sessions: Arc::new(Mutex::new(SessionManager::new())),
                host,
            },
            session: None,
            auto_sync: None,
        }
    }

    pub fn table(&self) -> Arc<RwLock<VirtualFileTable>> {
        Arc::clone(&self.shared.table)
    }

    pub fn settings(&self) -> Arc<RwLock<SyncSettings>> {
        Arc::clone(&self.shared.settings)
    }

    pub fn engine(&self) -> Arc<Mutex<SyncEngine>> {
        Arc::clone(&self.shared.engine)
    }

    pub fn session(&self) -> Option<SessionHandle> {
        self.session
    }

    /// Start a session for `project_name`, replacing any open one.
    ///
    /// Auto-sync is armed when enabled in settings and the project is
    /// enabled for sync.
    pub async fn open_project(&mut self, project_name: &str) -> SessionHandle {
        self.disable_auto_sync();
        let (folder, arm) = {
            let settings = self.shared.settings.read().await;
            (
                settings.folder_name_for(project_name),
                settings.auto_sync && settings.is_project_enabled(project_name),
            )
        };
        let handle = self
            .shared
            .sessions
            .lock()
            .await
            .open(project_name, &folder);
        self.session = Some(handle);
        if arm {
            self.enable_auto_sync().await;
        }
        handle
    }

    /// End the current session and hand back its history.
    pub async fn close_project(&mut self) -> Result<SyncSession> {
        self.disable_auto_sync();
        let handle = self.session.take().ok_or(Error::NoActiveSession)?;
        self.shared.sessions.lock().await.close(handle)
    }

    /// Enable sync for the open project.
    pub async fn enable_project_sync(&self, folder_name: Option<&str>) -> Result<()> {
        let project = self.project_name().await?;
        self.shared
            .settings
            .write()
            .await
            .enable_project(&project, folder_name);
        Ok(())
    }

    pub async fn disable_project_sync(&self) -> Result<()> {
        let project = self.project_name().await?;
        self.shared.settings.write().await.disable_project(&project);
        Ok(())
    }

    async fn project_name(&self) -> Result<String> {
        let sessions = self.shared.sessions.lock().await;
        sessions
            .active()
            .map(|s| s.project_name.clone())
            .ok_or(Error::NoActiveSession)
    }

    /// Run a sync now.
    pub async fn sync_now(&self) -> Result<HistoryEntry> {
        self.shared.sync().await
    }

    /// Save a file and, with `sync_on_save` on and the project enabled,
    /// sync afterwards. A sync refused by the guard interval is not an
    /// error here and yields `None`.
    pub async fn save(&self, path: &str, content: &str) -> Result<Option<HistoryEntry>> {
        self.shared.table.write().await.save(path, content).await?;

        let should_sync = {
            let settings = self.shared.settings.read().await;
            if !settings.sync_on_save {
                false
            } else {
                let project = self.project_name().await.ok();
                project.is_some_and(|p| settings.is_project_enabled(&p))
            }
        };
        if !should_sync {
            return Ok(None);
        }
        match self.shared.sync().await {
            Ok(entry) => Ok(Some(entry)),
            Err(Error::SyncThrottled { elapsed_ms }) => {
                tracing::debug!(elapsed_ms, "save-triggered sync skipped");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Feed watcher events into the table in debounced batches.
    pub async fn watch(&self, events: mpsc::Receiver<WatcherEvent>) -> JoinHandle<()> {
        let window = self.shared.settings.read().await.debounce();
        spawn_event_pump(Arc::clone(&self.shared.table), events, window)
    }

    pub fn is_auto_sync_armed(&self) -> bool {
        self.auto_sync.as_ref().is_some_and(AutoSync::is_armed)
    }

    /// Arm the auto-sync timer at the configured interval.
    pub async fn enable_auto_sync(&mut self) {
        let interval = {
            let mut settings = self.shared.settings.write().await;
            settings.auto_sync = true;
            settings.auto_sync_interval()
        };
        let shared = self.shared.clone();
        let mut auto = AutoSync::new(interval, move || {
            let shared = shared.clone();
            async move {
                match shared.sync().await {
                    Ok(entry) => tracing::debug!(status = ?entry.status, "auto-sync tick"),
                    Err(e) => tracing::warn!(error = %e, "auto-sync tick failed"),
                }
            }
        });
        auto.arm();
        self.auto_sync = Some(auto);
    }

    pub fn disable_auto_sync(&mut self) {
        if let Some(mut auto) = self.auto_sync.take() {
            auto.cancel();
        }
    }

    /// Change the auto-sync interval, re-arming a running timer.
    pub async fn set_auto_sync_interval(&mut self, interval: Duration) {
        let interval = {
            let mut settings = self.shared.settings.write().await;
            settings.auto_sync_interval_secs = interval.as_secs();
            settings.auto_sync_interval()
        };
        if let Some(auto) = self.auto_sync.as_mut() {
            auto.set_interval(interval);
        }
    }

    /// History of the current session.
    pub async fn history(&self) -> Vec<HistoryEntry> {
        self.shared
            .sessions
            .lock()
            .await
            .active()
            .map(|s| s.history.clone())
            .unwrap_or_default()
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        self.disable_auto_sync();
    }
}
