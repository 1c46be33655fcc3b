//! Three-way synchronization against a host directory
//!
//! Each text file under the project root is compared on three sides:
//! local content (the [`VirtualFileTable`](crate::VirtualFileTable)),
//! host content, and the known state recorded at the last sync decision.
//! See [`classify_change`] for the decision table.

mod engine;
mod exclude;
mod known;
mod report;
mod resolver;
mod scheduler;

pub use engine::SyncEngine;
pub use exclude::ExcludeMatcher;
pub use known::{FileAction, KnownFileState, KnownStateCache, classify_change};
pub use report::{HistoryEntry, StatsEntry, SyncStatistics, SyncStatus};
pub use resolver::{
    ChannelResolver, ConflictDecision, ConflictRequest, ConflictResolver, FixedResolver,
    SyncConflict,
};
pub use scheduler::AutoSync;
