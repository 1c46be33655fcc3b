//! Sync settings

mod settings;

pub use settings::{ConflictPolicy, ProjectSyncConfig, SyncSettings};
