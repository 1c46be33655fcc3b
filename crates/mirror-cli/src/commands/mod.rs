//! Command implementations

mod diff;
mod sync;

pub use diff::run_diff;
pub use sync::{SyncOptions, run_sync};
