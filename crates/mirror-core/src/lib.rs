//! Core layer for tree-mirror
//!
//! Keeps an in-memory mirror of a project tree and reconciles it against a
//! host directory:
//!
//! - **Virtual file table**: path → entry map fed by watcher events, with
//!   validated create/delete/rename/save against a backing filesystem and a
//!   self-healing modified set
//! - **Backends**: async traits for the virtual filesystem and the host
//!   directory, with local-disk and in-memory implementations
//! - **SyncEngine**: three-way classification (local, host, known state),
//!   conflict policy, history and statistics per run
//! - **Sessions and settings**: one active session per open project,
//!   per-project enablement keyed by normalized project name
//! - **Workspace**: the owned facade tying these together, including the
//!   auto-sync timer
//!
//! # Architecture
//!
//! ```text
//!                 CLI / host UI
//!                       |
//!                  mirror-core
//!                       |
//!            +----------+-----------+
//!            |                      |
//!        mirror-fs           mirror-content
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod session;
pub mod sync;
pub mod vfs;
pub mod workspace;

pub use backend::{
    HostDirectory, LocalFs, LocalHostDirectory, MemoryFs, MemoryHostDirectory, VirtualFs,
};
pub use config::{ConflictPolicy, ProjectSyncConfig, SyncSettings};
pub use error::{Error, ErrorKind, Result};
pub use session::{SessionHandle, SessionManager, SyncSession, normalize_project_name};
pub use sync::{
    AutoSync, ChannelResolver, ConflictDecision, ConflictRequest, ConflictResolver,
    ExcludeMatcher, FileAction, FixedResolver, HistoryEntry, KnownFileState, KnownStateCache,
    StatsEntry, SyncConflict, SyncEngine, SyncStatistics, SyncStatus, classify_change,
};
pub use vfs::{FileEntry, VirtualFileTable, WatcherEvent, spawn_event_pump};
pub use workspace::Workspace;
